use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::activity::ActivityError;
use crate::engine::EngineStopped;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
    InternalServerError(String),
}

impl From<EngineStopped> for ApiError {
    fn from(e: EngineStopped) -> Self {
        ApiError::Unavailable(e.to_string())
    }
}

impl From<ActivityError> for ApiError {
    fn from(e: ActivityError) -> Self {
        ApiError::InternalServerError(format!("Activity log unavailable: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let error_response = ErrorResponse {
            success: false,
            error: status.canonical_reason().map(str::to_string),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}
