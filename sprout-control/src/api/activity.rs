use axum::{Json, extract::State};
use sprout_core::ActivityEntry;

use super::ApiState;
use super::error::ApiError;
use super::models::{ApiResponse, ClearedResponse};

// List activity entries, newest first
pub async fn list_activity(
    State(state): State<ApiState>,
) -> Result<Json<ApiResponse<Vec<ActivityEntry>>>, ApiError> {
    let entries = state.activity.list().await?;
    Ok(Json(ApiResponse {
        success: true,
        data: Some(entries),
        message: None,
    }))
}

pub async fn clear_activity(
    State(state): State<ApiState>,
) -> Result<Json<ApiResponse<ClearedResponse>>, ApiError> {
    let deleted = state.activity.clear().await?;
    Ok(Json(ApiResponse {
        success: true,
        data: Some(ClearedResponse { deleted }),
        message: Some("Activity log cleared".to_string()),
    }))
}
