pub mod activity;
pub mod control;
pub mod error;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::activity::ActivitySink;
use crate::engine::EngineHandle;

#[derive(Clone)]
pub struct ApiState {
    pub engine: EngineHandle,
    pub activity: Arc<dyn ActivitySink>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Dashboard
        .route("/api/status", get(control::get_status))
        .route("/api/history", get(control::get_history))
        .route(
            "/api/activity",
            get(activity::list_activity).delete(activity::clear_activity),
        )
        // Session and settings
        .route("/api/session/start", post(control::start_session))
        .route("/api/session/end", post(control::end_session))
        .route("/api/location", put(control::set_location))
        .route("/api/crop", put(control::set_crop))
        .route("/api/automation", put(control::set_automation))
        .route("/api/auto-refresh", put(control::set_auto_refresh))
        // Device
        .route("/api/pump", post(control::command_pump))
        .route("/api/device/connect", post(control::connect_device))
        .route("/api/device/disconnect", post(control::disconnect_device))
        .route("/api/demo-moisture", post(control::set_demo_moisture))
        .route("/api/refresh", post(control::refresh))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}
