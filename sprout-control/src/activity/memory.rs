use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use sprout_core::{ActivityEntry, ActivityId};
use tokio::sync::RwLock;

use super::{ActivityError, ActivitySink};

/// In-process activity log holding at most `capacity` entries, newest first.
#[derive(Clone)]
pub struct MemoryActivityLog {
    entries: Arc<RwLock<VecDeque<ActivityEntry>>>,
    capacity: usize,
}

impl MemoryActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl ActivitySink for MemoryActivityLog {
    async fn record(&self, action: &str, details: &str) -> Result<(), ActivityError> {
        let mut entries = self.entries.write().await;
        entries.push_front(ActivityEntry {
            id: ActivityId::generate(),
            action: action.into(),
            details: details.into(),
            timestamp: jiff::Timestamp::now(),
        });
        entries.truncate(self.capacity);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ActivityEntry>, ActivityError> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }

    async fn clear(&self) -> Result<usize, ActivityError> {
        let mut entries = self.entries.write().await;
        let deleted = entries.len();
        entries.clear();
        Ok(deleted)
    }
}
