//! Data retention compliance cleanup

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    models::{
        audit_log::{AuditStatus, NewAuditLog, CLEANUP_FAILED, CLEANUP_SUCCEEDED},
        iso_timestamp, now_iso,
    },
    repository::audit_logs::AuditLogsRepository,
    status::{StatusTracker, StatusUpdate},
};

/// Rows removed by one cleanup run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedCounts {
    pub profiles: i64,
    pub visits: i64,
    pub dependents: i64,
}

/// Outcome of one cleanup run, mirroring the audit row it wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub status: AuditStatus,
    pub deleted: DeletedCounts,
    pub audit_written: bool,
}

/// Deletes visits older than the retention window together with their
/// dependents, then every unbanned visitor left without visits.
#[derive(Debug, Clone)]
pub struct RetentionJob {
    pool: SqlitePool,
    audit_logs: AuditLogsRepository,
    status: StatusTracker,
    retention_days: i64,
}

impl RetentionJob {
    pub fn new(pool: SqlitePool, status: StatusTracker, retention_days: i64) -> Self {
        Self {
            audit_logs: AuditLogsRepository::new(pool.clone()),
            pool,
            status,
            retention_days,
        }
    }

    /// Run the cleanup once. Every outcome, including failures, ends in exactly
    /// one audit row; nothing is returned as an error.
    pub async fn run_compliance_cleanup(&self) -> CleanupReport {
        tracing::info!("Starting data retention compliance cleanup");

        // Fixed-length days, leap years are not accounted for
        let cutoff = iso_timestamp(Utc::now() - Duration::days(self.retention_days));
        let mut deleted = DeletedCounts::default();

        let outcome = self.delete_expired(&cutoff, &mut deleted).await;
        let status = match &outcome {
            Ok(()) => {
                tracing::info!(
                    profiles = deleted.profiles,
                    visits = deleted.visits,
                    dependents = deleted.dependents,
                    "Compliance cleanup finished"
                );
                self.status.update(StatusUpdate::LastCleanup(now_iso())).await;
                AuditStatus::Ok
            }
            Err(e) => {
                tracing::error!("Compliance cleanup error: {}", e);
                self.status
                    .update(StatusUpdate::LastError(Some(format!("Cleanup Failed: {}", e))))
                    .await;
                AuditStatus::Error
            }
        };

        let entry = NewAuditLog {
            event_name: match status {
                AuditStatus::Ok => CLEANUP_SUCCEEDED,
                AuditStatus::Error => CLEANUP_FAILED,
            }
            .to_string(),
            timestamp: now_iso(),
            status,
            profiles_deleted: deleted.profiles,
            visits_deleted: deleted.visits,
            dependents_deleted: deleted.dependents,
        };

        let audit_written = match self.audit_logs.create(&entry).await {
            Ok(_) => {
                tracing::info!(status = %status, "Compliance audit log saved");
                true
            }
            Err(e) => {
                tracing::error!("CRITICAL: cleanup job could not write to audit_logs: {}", e);
                false
            }
        };

        CleanupReport {
            status,
            deleted,
            audit_written,
        }
    }

    /// The three phases run strictly in order: dependents reference visits,
    /// and a visitor is only orphaned once its visits are gone.
    async fn delete_expired(&self, cutoff: &str, deleted: &mut DeletedCounts) -> Result<(), sqlx::Error> {
        deleted.dependents = sqlx::query(
            "DELETE FROM dependents WHERE visit_id IN (SELECT id FROM visits WHERE entry_time < ?1)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected() as i64;

        deleted.visits = sqlx::query("DELETE FROM visits WHERE entry_time < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected() as i64;

        deleted.profiles = sqlx::query(
            r#"
            DELETE FROM visitors
            WHERE is_banned = 0
              AND NOT EXISTS (SELECT 1 FROM visits WHERE visits.visitor_id = visitors.id)
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected() as i64;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maintenance::{migrate, open_pool, DATA_RETENTION_DAYS};
    use crate::models::audit_log::AuditLogEntry;

    async fn store() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir.path().join("database.db"), 1).await.unwrap();
        migrate(&pool).await.unwrap();
        (dir, pool)
    }

    async fn visitor(pool: &SqlitePool, id: i64, banned: bool) {
        sqlx::query("INSERT INTO visitors (id, first_name, last_name, is_banned) VALUES (?1, 'Ann', 'Lee', ?2)")
            .bind(id)
            .bind(banned)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn visit(pool: &SqlitePool, id: i64, visitor_id: i64, days_ago: i64) {
        sqlx::query(
            "INSERT INTO visits (id, visitor_id, entry_time, unit, type) VALUES (?1, ?2, ?3, '4B', 'Visitor')",
        )
        .bind(id)
        .bind(visitor_id)
        .bind(iso_timestamp(Utc::now() - Duration::days(days_ago)))
        .execute(pool)
        .await
        .unwrap();
    }

    async fn dependent(pool: &SqlitePool, visit_id: i64) {
        sqlx::query("INSERT INTO dependents (full_name, age, visit_id) VALUES ('Kid', 7, ?1)")
            .bind(visit_id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn audit_rows(pool: &SqlitePool) -> Vec<AuditLogEntry> {
        AuditLogsRepository::new(pool.clone()).list().await.unwrap()
    }

    fn job(pool: &SqlitePool, status: &StatusTracker) -> RetentionJob {
        RetentionJob::new(pool.clone(), status.clone(), DATA_RETENTION_DAYS)
    }

    #[tokio::test]
    async fn expired_visit_cascades_to_dependents_and_profile() {
        let (_dir, pool) = store().await;
        visitor(&pool, 1, false).await;
        visit(&pool, 10, 1, 3 * 365).await;
        dependent(&pool, 10).await;
        visitor(&pool, 2, false).await;
        visit(&pool, 20, 2, 0).await;
        let status = StatusTracker::new();

        let report = job(&pool, &status).run_compliance_cleanup().await;

        assert_eq!(report.status, AuditStatus::Ok);
        assert_eq!(
            report.deleted,
            DeletedCounts {
                profiles: 1,
                visits: 1,
                dependents: 1
            }
        );
        assert_eq!(count(&pool, "dependents").await, 0);
        assert_eq!(count(&pool, "visits").await, 1);
        let remaining: Vec<i64> = sqlx::query_scalar("SELECT id FROM visitors")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![2]);

        let audit = audit_rows(&pool).await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].event_name, "Compliance Cleanup Succeeded");
        assert_eq!(audit[0].status, "OK");
        assert_eq!(audit[0].profiles_deleted, Some(1));
        assert_eq!(audit[0].visits_deleted, Some(1));
        assert_eq!(audit[0].dependents_deleted, Some(1));
        assert_ne!(status.snapshot().await.last_cleanup, "N/A");
    }

    #[tokio::test]
    async fn banned_visitors_are_never_deleted() {
        let (_dir, pool) = store().await;
        visitor(&pool, 1, true).await;
        visitor(&pool, 2, true).await;
        visit(&pool, 10, 2, 5 * 365).await;
        let status = StatusTracker::new();

        let report = job(&pool, &status).run_compliance_cleanup().await;

        assert_eq!(report.deleted.visits, 1);
        assert_eq!(report.deleted.profiles, 0);
        assert_eq!(count(&pool, "visitors").await, 2);
    }

    #[tokio::test]
    async fn recent_visits_survive() {
        let (_dir, pool) = store().await;
        visitor(&pool, 1, false).await;
        visit(&pool, 10, 1, 0).await;
        dependent(&pool, 10).await;
        visitor(&pool, 2, false).await;
        visit(&pool, 20, 2, DATA_RETENTION_DAYS - 1).await;
        let status = StatusTracker::new();

        let report = job(&pool, &status).run_compliance_cleanup().await;

        assert_eq!(report.deleted, DeletedCounts::default());
        assert_eq!(count(&pool, "visits").await, 2);
        assert_eq!(count(&pool, "dependents").await, 1);
        assert_eq!(count(&pool, "visitors").await, 2);
    }

    #[tokio::test]
    async fn repeated_runs_are_safe() {
        let (_dir, pool) = store().await;
        visitor(&pool, 1, false).await;
        visit(&pool, 10, 1, 800).await;
        let status = StatusTracker::new();
        let job = job(&pool, &status);

        let first = job.run_compliance_cleanup().await;
        let second = job.run_compliance_cleanup().await;

        assert_eq!(first.deleted.visits, 1);
        assert_eq!(second.deleted, DeletedCounts::default());
        assert_eq!(audit_rows(&pool).await.len(), 2);
    }

    #[tokio::test]
    async fn failure_is_audited_with_partial_counts() {
        let (_dir, pool) = store().await;
        visitor(&pool, 1, false).await;
        visit(&pool, 10, 1, 900).await;
        dependent(&pool, 10).await;
        // Breaks the final phase only
        sqlx::query("ALTER TABLE visitors RENAME TO visitors_archive")
            .execute(&pool)
            .await
            .unwrap();
        let status = StatusTracker::new();

        let report = job(&pool, &status).run_compliance_cleanup().await;

        assert_eq!(report.status, AuditStatus::Error);
        assert_eq!(report.deleted.dependents, 1);
        assert_eq!(report.deleted.visits, 1);
        assert_eq!(report.deleted.profiles, 0);
        assert!(report.audit_written);

        let audit = audit_rows(&pool).await;
        assert_eq!(audit[0].event_name, "Compliance Cleanup Failed");
        assert_eq!(audit[0].status, "ERROR");

        let snapshot = status.snapshot().await;
        assert!(snapshot.last_error.unwrap().starts_with("Cleanup Failed:"));
        assert_eq!(snapshot.last_cleanup, "N/A");
    }

    #[tokio::test]
    async fn missing_audit_table_does_not_panic() {
        let (_dir, pool) = store().await;
        sqlx::query("DROP TABLE audit_logs").execute(&pool).await.unwrap();
        let status = StatusTracker::new();

        let report = job(&pool, &status).run_compliance_cleanup().await;

        assert_eq!(report.status, AuditStatus::Ok);
        assert!(!report.audit_written);
    }
}
