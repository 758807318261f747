//! Audit trail and client crash reports

use validator::Validate;

use crate::{
    error::AppResult,
    models::audit_log::{AuditLogEntry, ClientErrorReport},
    repository::Repository,
    status::{StatusTracker, StatusUpdate},
};

#[derive(Clone)]
pub struct AuditService {
    repository: Repository,
    status: StatusTracker,
}

impl AuditService {
    pub fn new(repository: Repository, status: StatusTracker) -> Self {
        Self { repository, status }
    }

    /// All audit rows, newest first
    pub async fn history(&self) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.audit_logs.list().await
    }

    /// Record a client-side crash in the log and surface it on the status widget
    pub async fn log_client_error(&self, report: &ClientErrorReport) -> AppResult<()> {
        if let Err(e) = report.validate() {
            tracing::warn!("Audit: rejected log-error due to missing fields");
            return Err(e.into());
        }

        let event_name = report.event_name.as_deref().unwrap_or_default();
        self.status
            .update(StatusUpdate::LastError(Some(format!("Client Crash: {}", event_name))))
            .await;

        tracing::error!(
            time = report.timestamp.as_deref().unwrap_or_default(),
            status = report.status.as_deref().unwrap_or_default(),
            stack = report.client_stack.as_deref().unwrap_or_default(),
            context = %report.client_info.clone().unwrap_or_default(),
            "[RENDER_CRASH] {}: {}",
            event_name,
            report.client_message.as_deref().unwrap_or("No message"),
        );

        Ok(())
    }
}
