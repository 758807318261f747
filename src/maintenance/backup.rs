//! Daily store snapshots, snapshot pruning and restore

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::{
    models::now_iso,
    status::{StatusTracker, StatusUpdate},
};

/// Name of the snapshot directory inside the data directory
pub const BACKUP_DIR_NAME: &str = "backups";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("store file name {0:?} has no usable base name")]
    InvalidStoreName(PathBuf),

    #[error("no backup directory at {0}")]
    NoBackupDir(PathBuf),

    #[error("no snapshot found in {0}")]
    NoSnapshot(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> BackupError {
    let context = context.into();
    move |source| BackupError::Io { context, source }
}

/// Base name and extension used to name snapshots of a store file.
///
/// `database.db` yields snapshots named `database-YYYY-MM-DD.db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNaming {
    prefix: String,
    extension: String,
}

impl SnapshotNaming {
    pub fn for_store(store_file_name: &str) -> Option<Self> {
        let mut parts = store_file_name.split('.');
        let prefix = parts.next().filter(|p| !p.is_empty())?.to_string();
        let extension = Path::new(store_file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("db")
            .to_string();
        Some(Self { prefix, extension })
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}-{}.{}", self.prefix, date.format("%Y-%m-%d"), self.extension)
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&format!("{}-", self.prefix))
            && file_name.ends_with(&format!(".{}", self.extension))
    }
}

/// Creates, prunes and restores snapshots of the live store.
#[derive(Debug, Clone)]
pub struct BackupManager {
    retention: Duration,
    status: StatusTracker,
}

impl BackupManager {
    pub fn new(retention_days: u64, status: StatusTracker) -> Self {
        Self {
            retention: Duration::from_secs(retention_days * 24 * 60 * 60),
            status,
        }
    }

    pub fn backup_dir(data_dir: &Path) -> PathBuf {
        data_dir.join(BACKUP_DIR_NAME)
    }

    /// Snapshot the store for the current UTC date and prune expired snapshots.
    ///
    /// A second call on the same day copies nothing but still prunes and
    /// refreshes `last_backup`. Returns false on any I/O failure, leaving the
    /// status untouched.
    pub async fn create_backup(&self, store_path: &Path, data_dir: &Path) -> bool {
        match self.try_create_backup(store_path, data_dir).await {
            Ok(_) => {
                self.status.update(StatusUpdate::LastBackup(now_iso())).await;
                true
            }
            Err(e) => {
                tracing::error!("Error creating automated backup: {}", e);
                false
            }
        }
    }

    async fn try_create_backup(&self, store_path: &Path, data_dir: &Path) -> Result<PathBuf, BackupError> {
        let backup_dir = Self::backup_dir(data_dir);
        tokio::fs::create_dir_all(&backup_dir)
            .await
            .map_err(io_error(format!("creating {}", backup_dir.display())))?;

        let naming = store_path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(SnapshotNaming::for_store)
            .ok_or_else(|| BackupError::InvalidStoreName(store_path.to_path_buf()))?;

        let date = Utc::now().date_naive();
        let snapshot_path = backup_dir.join(naming.file_name(date));

        if tokio::fs::try_exists(&snapshot_path).await.unwrap_or(false) {
            tracing::info!(snapshot = %snapshot_path.display(), "Daily backup for {} already exists, skipping", date);
        } else {
            // Copy under a name the snapshot scheme never matches, then move into place
            let partial = snapshot_path.with_extension("partial");
            if let Err(source) = tokio::fs::copy(store_path, &partial).await {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(BackupError::Io {
                    context: format!("copying {}", store_path.display()),
                    source,
                });
            }
            tokio::fs::rename(&partial, &snapshot_path)
                .await
                .map_err(io_error(format!("finalizing {}", snapshot_path.display())))?;
            tracing::info!(snapshot = %snapshot_path.display(), "Automated daily backup created");
        }

        clean_old_backups(&backup_dir, &naming, self.retention).await;
        Ok(snapshot_path)
    }

    /// Copy the newest snapshot over the live store.
    ///
    /// The live file is only written once a snapshot has been found.
    pub async fn restore_from_backup(&self, data_dir: &Path, store_file_name: &str) -> bool {
        tracing::info!("Attempting database recovery");
        match try_restore(data_dir, store_file_name).await {
            Ok(snapshot) => {
                tracing::info!(snapshot = %snapshot.display(), "Restored database from latest backup");
                true
            }
            Err(e @ (BackupError::NoBackupDir(_) | BackupError::NoSnapshot(_))) => {
                tracing::warn!("Cannot restore: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("Error during database restoration: {}", e);
                false
            }
        }
    }
}

async fn try_restore(data_dir: &Path, store_file_name: &str) -> Result<PathBuf, BackupError> {
    let backup_dir = BackupManager::backup_dir(data_dir);
    let naming = SnapshotNaming::for_store(store_file_name)
        .ok_or_else(|| BackupError::InvalidStoreName(PathBuf::from(store_file_name)))?;

    if !tokio::fs::try_exists(&backup_dir).await.unwrap_or(false) {
        return Err(BackupError::NoBackupDir(backup_dir));
    }

    let latest = list_snapshots(&backup_dir, &naming)
        .await?
        .into_iter()
        .max()
        .ok_or_else(|| BackupError::NoSnapshot(backup_dir.clone()))?;

    let snapshot_path = backup_dir.join(&latest);
    let store_path = data_dir.join(store_file_name);
    tokio::fs::copy(&snapshot_path, &store_path)
        .await
        .map_err(io_error(format!("copying {} over {}", snapshot_path.display(), store_path.display())))?;

    // A leftover journal would be replayed into the restored file
    for suffix in ["-journal", "-wal", "-shm"] {
        let sidecar = data_dir.join(format!("{}{}", store_file_name, suffix));
        if tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
            if let Err(e) = tokio::fs::remove_file(&sidecar).await {
                tracing::warn!(path = %sidecar.display(), "Could not remove stale journal: {}", e);
            }
        }
    }

    Ok(snapshot_path)
}

async fn list_snapshots(backup_dir: &Path, naming: &SnapshotNaming) -> Result<Vec<String>, BackupError> {
    let mut entries = tokio::fs::read_dir(backup_dir)
        .await
        .map_err(io_error(format!("reading {}", backup_dir.display())))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(io_error(format!("reading {}", backup_dir.display())))?
    {
        if let Some(name) = entry.file_name().to_str() {
            if naming.matches(name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Delete snapshots last modified more than `retention` ago.
///
/// Best effort: a file that cannot be inspected or removed is logged and
/// skipped. Returns the number of files removed.
pub async fn clean_old_backups(backup_dir: &Path, naming: &SnapshotNaming, retention: Duration) -> usize {
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let names = match list_snapshots(backup_dir, naming).await {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("Error during backup cleanup: {}", e);
            return 0;
        }
    };

    let mut deleted = 0;
    for name in names {
        let path = backup_dir.join(&name);
        let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(file = %name, "Could not read backup metadata: {}", e);
                continue;
            }
        };

        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(file = %name, "Could not delete old backup: {}", e),
            }
        }
    }

    let days = retention.as_secs() / (24 * 60 * 60);
    if deleted > 0 {
        tracing::info!("Cleaned up {} old backup file(s) (older than {} days)", deleted, days);
    } else {
        tracing::debug!("No backups older than {} days to clean up", days);
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn manager() -> (BackupManager, StatusTracker) {
        let status = StatusTracker::new();
        (BackupManager::new(7, status.clone()), status)
    }

    fn set_age(path: &Path, age: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn snapshots(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn naming_follows_store_file() {
        let naming = SnapshotNaming::for_store("database.db").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(naming.file_name(date), "database-2024-03-09.db");
        assert!(naming.matches("database-2024-03-09.db"));
        assert!(!naming.matches("database-2024-03-09.partial"));
        assert!(!naming.matches("other-2024-03-09.db"));
        assert!(SnapshotNaming::for_store(".db").is_none());
    }

    #[tokio::test]
    async fn daily_backup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("database.db");
        fs::write(&store, b"store contents").unwrap();
        let (manager, status) = manager();

        assert!(manager.create_backup(&store, dir.path()).await);
        let first_backup = status.snapshot().await.last_backup;
        assert_ne!(first_backup, "N/A");

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(manager.create_backup(&store, dir.path()).await);

        let backup_dir = dir.path().join("backups");
        let today = SnapshotNaming::for_store("database.db")
            .unwrap()
            .file_name(Utc::now().date_naive());
        assert_eq!(snapshots(&backup_dir), vec![today.clone()]);
        assert_eq!(fs::read(backup_dir.join(today)).unwrap(), b"store contents");
        assert_ne!(status.snapshot().await.last_backup, first_backup);
    }

    #[tokio::test]
    async fn failed_copy_leaves_status_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, status) = manager();

        assert!(!manager.create_backup(&dir.path().join("database.db"), dir.path()).await);
        assert_eq!(status.snapshot().await.last_backup, "N/A");
        assert!(snapshots(&dir.path().join("backups")).is_empty());
    }

    #[tokio::test]
    async fn prunes_snapshots_past_retention() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("database.db");
        fs::write(&store, b"live").unwrap();
        let backup_dir = dir.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        let naming = SnapshotNaming::for_store("database.db").unwrap();
        let today = Utc::now().date_naive();
        let mut expected_kept = vec![naming.file_name(today)];
        for days_ago in 1..=10u32 {
            let name = naming.file_name(today - chrono::Duration::days(days_ago.into()));
            let path = backup_dir.join(&name);
            fs::write(&path, b"old").unwrap();
            // An hour short of the full day count keeps the 7-day file inside the window
            set_age(&path, DAY * days_ago - Duration::from_secs(3600));
            if days_ago <= 7 {
                expected_kept.push(name);
            }
        }
        fs::write(backup_dir.join("notes.txt"), b"unrelated").unwrap();
        set_age(&backup_dir.join("notes.txt"), DAY * 30);

        let (manager, _) = manager();
        assert!(manager.create_backup(&store, dir.path()).await);

        expected_kept.push("notes.txt".to_string());
        expected_kept.sort();
        assert_eq!(snapshots(&backup_dir), expected_kept);
    }

    #[tokio::test]
    async fn restores_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("database-2024-01-30.db"), b"older").unwrap();
        fs::write(backup_dir.join("database-2024-02-01.db"), b"newest").unwrap();
        fs::write(backup_dir.join("database-2024-01-31.db"), b"middle").unwrap();
        fs::write(dir.path().join("database.db-journal"), b"stale").unwrap();

        let (manager, _) = manager();
        assert!(manager.restore_from_backup(dir.path(), "database.db").await);

        assert_eq!(fs::read(dir.path().join("database.db")).unwrap(), b"newest");
        assert!(!dir.path().join("database.db-journal").exists());
    }

    #[tokio::test]
    async fn restore_without_snapshots_leaves_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("database.db");
        fs::write(&store, b"corrupt but precious").unwrap();
        let (manager, _) = manager();

        // No backup directory at all
        assert!(!manager.restore_from_backup(dir.path(), "database.db").await);
        assert_eq!(fs::read(&store).unwrap(), b"corrupt but precious");

        // Backup directory without matching snapshots
        fs::create_dir_all(dir.path().join("backups")).unwrap();
        fs::write(dir.path().join("backups/other-2024-01-01.db"), b"x").unwrap();
        assert!(!manager.restore_from_backup(dir.path(), "database.db").await);
        assert_eq!(fs::read(&store).unwrap(), b"corrupt but precious");
    }

    #[tokio::test]
    async fn missing_backup_dir_is_not_fatal_for_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let naming = SnapshotNaming::for_store("database.db").unwrap();
        assert_eq!(clean_old_backups(&dir.path().join("nope"), &naming, DAY).await, 0);
    }
}
