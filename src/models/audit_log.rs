//! Audit log model

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

pub const CLEANUP_SUCCEEDED: &str = "Compliance Cleanup Succeeded";
pub const CLEANUP_FAILED: &str = "Compliance Cleanup Failed";

/// Outcome recorded on an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Ok,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "OK",
            AuditStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored audit row
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditLogEntry {
    pub id: i64,
    pub event_name: String,
    pub timestamp: String,
    /// "OK" or "ERROR"; rows written by older releases may hold other values
    pub status: String,
    pub profiles_deleted: Option<i64>,
    pub visits_deleted: Option<i64>,
    pub dependents_deleted: Option<i64>,
}

/// Audit row to append
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub event_name: String,
    pub timestamp: String,
    pub status: AuditStatus,
    pub profiles_deleted: i64,
    pub visits_deleted: i64,
    pub dependents_deleted: i64,
}

/// Crash report sent by the desk client
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClientErrorReport {
    #[validate(required(message = "event_name is required"), length(min = 1))]
    pub event_name: Option<String>,
    #[validate(required(message = "timestamp is required"), length(min = 1))]
    pub timestamp: Option<String>,
    #[validate(required(message = "status is required"), length(min = 1))]
    pub status: Option<String>,
    pub client_message: Option<String>,
    pub client_stack: Option<String>,
    #[schema(value_type = Object)]
    pub client_info: Option<serde_json::Value>,
}
