use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sprout_core::{PumpCommand, SensorReading};

use super::ApiState;
use super::error::ApiError;
use super::models::{
    ApiResponse, ConnectRequest, CropRequest, DemoMoistureRequest, LocationRequest, ToggleRequest,
};
use crate::engine::Command;
use crate::state::DashboardSnapshot;

fn success_response<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    let api_response = ApiResponse {
        success: true,
        data: Some(data),
        message: None,
    };
    (status, Json(api_response)).into_response()
}

// Commands are applied by the control loop; the new state shows up in /api/status.
async fn dispatch(state: &ApiState, command: Command) -> Result<Response, ApiError> {
    state.engine.send(command).await?;
    let api_response = ApiResponse::<()> {
        success: true,
        data: None,
        message: Some("accepted".to_string()),
    };
    Ok((StatusCode::ACCEPTED, Json(api_response)).into_response())
}

pub async fn get_status(State(state): State<ApiState>) -> Json<ApiResponse<DashboardSnapshot>> {
    Json(ApiResponse {
        success: true,
        data: Some(state.engine.snapshot()),
        message: None,
    })
}

pub async fn get_history(State(state): State<ApiState>) -> Response {
    let history: Vec<SensorReading> = state.engine.snapshot().history;
    success_response(StatusCode::OK, history)
}

pub async fn start_session(State(state): State<ApiState>) -> Result<Response, ApiError> {
    dispatch(&state, Command::StartSession).await
}

pub async fn end_session(State(state): State<ApiState>) -> Result<Response, ApiError> {
    dispatch(&state, Command::EndSession).await
}

pub async fn set_location(
    State(state): State<ApiState>,
    Json(request): Json<LocationRequest>,
) -> Result<Response, ApiError> {
    dispatch(&state, Command::SetLocation(request.location)).await
}

pub async fn set_crop(
    State(state): State<ApiState>,
    Json(request): Json<CropRequest>,
) -> Result<Response, ApiError> {
    dispatch(&state, Command::SetCrop(request.crop)).await
}

pub async fn set_automation(
    State(state): State<ApiState>,
    Json(request): Json<ToggleRequest>,
) -> Result<Response, ApiError> {
    dispatch(&state, Command::SetAutomation(request.enabled)).await
}

pub async fn set_auto_refresh(
    State(state): State<ApiState>,
    Json(request): Json<ToggleRequest>,
) -> Result<Response, ApiError> {
    dispatch(&state, Command::SetAutoRefresh(request.enabled)).await
}

pub async fn command_pump(
    State(state): State<ApiState>,
    Json(request): Json<PumpCommand>,
) -> Result<Response, ApiError> {
    let connected = state.engine.snapshot().device.connected;
    let response = dispatch(&state, Command::ManualPump(request.state)).await?;
    if !connected {
        return Err(ApiError::Conflict(
            "Cannot control pump. Device is not connected.".to_string(),
        ));
    }
    Ok(response)
}

pub async fn connect_device(
    State(state): State<ApiState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Response, ApiError> {
    if request.addr.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Please enter an IP address.".to_string(),
        ));
    }
    dispatch(&state, Command::Connect(request.addr)).await
}

pub async fn disconnect_device(State(state): State<ApiState>) -> Result<Response, ApiError> {
    dispatch(&state, Command::Disconnect).await
}

pub async fn set_demo_moisture(
    State(state): State<ApiState>,
    Json(request): Json<DemoMoistureRequest>,
) -> Result<Response, ApiError> {
    if !request.moisture.is_finite() {
        return Err(ApiError::BadRequest(
            "Moisture must be a number between 0 and 100.".to_string(),
        ));
    }
    dispatch(&state, Command::SetDemoMoisture(request.moisture)).await
}

pub async fn refresh(State(state): State<ApiState>) -> Result<Response, ApiError> {
    dispatch(&state, Command::RefreshNow).await
}
