//! Audit log repository

use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::audit_log::{AuditLogEntry, NewAuditLog},
};

#[derive(Clone, Debug)]
pub struct AuditLogsRepository {
    pool: SqlitePool,
}

impl AuditLogsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an audit row, returning its id
    pub async fn create(&self, entry: &NewAuditLog) -> AppResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (event_name, timestamp, status, profiles_deleted, visits_deleted, dependents_deleted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.event_name)
        .bind(&entry.timestamp)
        .bind(entry.status.as_str())
        .bind(entry.profiles_deleted)
        .bind(entry.visits_deleted)
        .bind(entry.dependents_deleted)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All audit rows, newest first
    pub async fn list(&self) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
