use serde::{Deserialize, Serialize};

// Request Models
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CropRequest {
    pub crop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct DemoMoistureRequest {
    pub moisture: f64,
}

// Response Models
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub deleted: usize,
}
