//! In-memory health status shared by the maintenance jobs and the status endpoint

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Placeholder shown until a backup or cleanup has completed
pub const NOT_AVAILABLE: &str = "N/A";

/// Point-in-time copy of the service health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusSnapshot {
    /// True once the store passed its integrity check and the schema is migrated
    pub db_ready: bool,
    /// Time of the latest successful backup, or "N/A"
    pub last_backup: String,
    /// Time of the latest successful compliance cleanup, or "N/A"
    pub last_cleanup: String,
    /// Latest severe error message, if any
    pub last_error: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            db_ready: false,
            last_backup: NOT_AVAILABLE.to_string(),
            last_cleanup: NOT_AVAILABLE.to_string(),
            last_error: None,
        }
    }
}

/// A single status field overwrite
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    DbReady(bool),
    LastBackup(String),
    LastCleanup(String),
    LastError(Option<String>),
}

/// Process-wide status record.
///
/// Cloning is cheap and every clone observes the same state. Updates are
/// unconditional overwrites, last write wins.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn update(&self, update: StatusUpdate) {
        let mut status = self.inner.write().await;
        match update {
            StatusUpdate::DbReady(ready) => status.db_ready = ready,
            StatusUpdate::LastBackup(at) => status.last_backup = at,
            StatusUpdate::LastCleanup(at) => status.last_cleanup = at,
            StatusUpdate::LastError(message) => status.last_error = message,
        }
    }

    /// Returns a copy; later updates are not reflected in it
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_defaults() {
        let tracker = StatusTracker::new();
        let status = tracker.snapshot().await;

        assert!(!status.db_ready);
        assert_eq!(status.last_backup, "N/A");
        assert_eq!(status.last_cleanup, "N/A");
        assert_eq!(status.last_error, None);
    }

    #[tokio::test]
    async fn updates_are_shared_between_clones() {
        let tracker = StatusTracker::new();
        let handle = tracker.clone();

        handle.update(StatusUpdate::DbReady(true)).await;
        handle
            .update(StatusUpdate::LastError(Some("Cleanup Failed: disk I/O error".into())))
            .await;

        let status = tracker.snapshot().await;
        assert!(status.db_ready);
        assert_eq!(status.last_error.as_deref(), Some("Cleanup Failed: disk I/O error"));
    }

    #[tokio::test]
    async fn snapshot_is_a_copy() {
        let tracker = StatusTracker::new();
        let before = tracker.snapshot().await;

        tracker
            .update(StatusUpdate::LastBackup("2024-05-01T09:30:00.000Z".into()))
            .await;

        assert_eq!(before.last_backup, "N/A");
        assert_eq!(tracker.snapshot().await.last_backup, "2024-05-01T09:30:00.000Z");
    }

    #[tokio::test]
    async fn last_error_can_be_cleared() {
        let tracker = StatusTracker::new();
        tracker.update(StatusUpdate::LastError(Some("boom".into()))).await;
        tracker.update(StatusUpdate::LastError(None)).await;

        assert_eq!(tracker.snapshot().await.last_error, None);
    }
}
