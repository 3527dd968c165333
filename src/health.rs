use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive failures before the service reports itself degraded.
pub const DEGRADED_AFTER: usize = 3;
/// Consecutive failures before `/health` answers 503.
pub const UNAVAILABLE_AFTER: usize = 6;

/// Sync loop health, shared with the HTTP layer.
#[derive(Clone, Default)]
pub struct HealthState {
    pub last_sync_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub last_sync_count: Arc<RwLock<usize>>,
    pub error_count: Arc<RwLock<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub last_sync: Option<String>,
    pub last_sync_count: usize,
    pub consecutive_errors: usize,
}

impl HealthSnapshot {
    pub fn is_unavailable(&self) -> bool {
        self.consecutive_errors >= UNAVAILABLE_AFTER
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self, count: usize) {
        *self.last_sync_time.write().await = Some(Utc::now());
        *self.last_sync_count.write().await = count;
        *self.error_count.write().await = 0;
    }

    pub async fn record_error(&self) {
        *self.error_count.write().await += 1;
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        let last_sync = *self.last_sync_time.read().await;
        let last_sync_count = *self.last_sync_count.read().await;
        let errors = *self.error_count.read().await;

        HealthSnapshot {
            status: if errors >= DEGRADED_AFTER { "degraded" } else { "ok" },
            last_sync: last_sync.map(|t| t.to_rfc3339()),
            last_sync_count,
            consecutive_errors: errors,
        }
    }
}
