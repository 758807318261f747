//! Store lifecycle: integrity check, recovery, backups and retention cleanup

pub mod backup;
pub mod integrity;
pub mod retention;

use std::path::Path;

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    config::AppConfig,
    status::{StatusTracker, StatusUpdate},
};

pub use backup::BackupManager;
pub use integrity::check_integrity;
pub use retention::{CleanupReport, RetentionJob};

/// Visit data older than this many days is deleted (two 365-day years)
pub const DATA_RETENTION_DAYS: i64 = 2 * 365;

/// Snapshots older than this many days are deleted
pub const BACKUP_RETENTION_DAYS: u64 = 7;

/// Open a pool on the store file, creating it when missing.
///
/// Foreign keys are enforced and the rollback journal is used so that a plain
/// file copy of a quiescent store is a complete snapshot.
pub async fn open_pool(store_path: &Path, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(connect_options(store_path))
        .await
}

fn connect_options(store_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(store_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Delete)
}

/// Apply pending schema migrations
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Bring the store into a usable state at startup.
///
/// Runs the integrity check, restores the newest snapshot when it fails,
/// opens and migrates the store, then (only when the store is ready) takes
/// today's snapshot and runs the retention cleanup. The pool is returned even
/// when the store is degraded so the HTTP layer can keep reporting status.
pub async fn prepare_store(config: &AppConfig, status: &StatusTracker) -> SqlitePool {
    let data_dir = config.storage.data_dir.as_path();
    let store_path = config.database_path();
    if let Err(e) = tokio::fs::create_dir_all(data_dir).await {
        tracing::error!(path = %data_dir.display(), "Could not create data directory: {}", e);
    }
    let store_existed = tokio::fs::try_exists(&store_path).await.unwrap_or(false);
    let backups = BackupManager::new(config.retention.backup_retention_days, status.clone());

    let mut healthy = check_integrity(&store_path).await;
    let mut restored = false;
    if !healthy {
        restored = backups
            .restore_from_backup(data_dir, &config.storage.database_file)
            .await;
        if restored {
            healthy = check_integrity(&store_path).await;
        }
    }

    // A missing store with nothing to restore is a first start, not a failure
    let fresh = !store_existed && !restored;
    if !healthy && !fresh {
        tracing::error!("Database failed its integrity check and no healthy backup could be restored");
        status
            .update(StatusUpdate::LastError(Some(
                "Database integrity check failed and recovery was unsuccessful".to_string(),
            )))
            .await;
    }

    let pool = match open_pool(&store_path, config.storage.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database error: {}", e);
            status
                .update(StatusUpdate::LastError(Some(format!("Database error: {}", e))))
                .await;
            SqlitePoolOptions::new()
                .max_connections(config.storage.max_connections.max(1))
                .connect_lazy_with(connect_options(&store_path))
        }
    };

    let migrated = match migrate(&pool).await {
        Ok(()) => {
            tracing::info!("Database migrations completed");
            true
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            status
                .update(StatusUpdate::LastError(Some(format!("Migration failed: {}", e))))
                .await;
            false
        }
    };

    let ready = migrated && (healthy || fresh);
    status.update(StatusUpdate::DbReady(ready)).await;
    if !ready {
        tracing::warn!("Database is not ready, skipping backup and retention cleanup");
        return pool;
    }

    backups.create_backup(&store_path, data_dir).await;
    RetentionJob::new(pool.clone(), status.clone(), config.retention.data_retention_days)
        .run_compliance_cleanup()
        .await;

    pool
}
