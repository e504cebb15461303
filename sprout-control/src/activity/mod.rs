pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sprout_core::ActivityEntry;
use tracing::error;

pub use http::HttpActivityLog;
pub use memory::MemoryActivityLog;

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("activity backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("activity backend responded with {status}: {body}")]
    Status { status: u16, body: String },
}

/// Audit trail for pump actions and advisory recommendations.
#[async_trait]
pub trait ActivitySink: Send + Sync + 'static {
    async fn record(&self, action: &str, details: &str) -> Result<(), ActivityError>;

    /// Entries, newest first.
    async fn list(&self) -> Result<Vec<ActivityEntry>, ActivityError>;

    /// Remove every entry, returning how many were deleted.
    async fn clear(&self) -> Result<usize, ActivityError>;
}

/// Record an entry without waiting for the sink. Failures are logged and
/// otherwise ignored.
pub fn record_detached(sink: &Arc<dyn ActivitySink>, action: String, details: String) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(e) = sink.record(&action, &details).await {
            error!(error = %e, action, "Failed to record activity");
        }
    });
}
