//! Startup integrity check of the store file

use std::path::Path;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    Connection,
};

/// Run `PRAGMA integrity_check` against the store through a read-only connection.
///
/// Returns false when the file is missing, cannot be opened, the pragma fails
/// or reports any problem. Never fails itself.
pub async fn check_integrity(store_path: &Path) -> bool {
    if !tokio::fs::try_exists(store_path).await.unwrap_or(false) {
        tracing::warn!(path = %store_path.display(), "Database file is missing (integrity check)");
        return false;
    }

    let options = SqliteConnectOptions::new()
        .filename(store_path)
        .read_only(true)
        .create_if_missing(false);

    let mut conn = match SqliteConnection::connect_with(&options).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(
                path = %store_path.display(),
                "Could not open database file for integrity check: {}",
                e
            );
            return false;
        }
    };

    let result = sqlx::query_scalar::<_, String>("PRAGMA integrity_check")
        .fetch_all(&mut conn)
        .await;

    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close integrity check connection: {}", e);
    }

    match result {
        Ok(rows) => {
            let corrupt = rows.iter().any(|row| row != "ok");
            if corrupt {
                tracing::error!(
                    problems = rows.len(),
                    first = rows.first().map(String::as_str).unwrap_or_default(),
                    "Database corruption detected by PRAGMA integrity_check"
                );
            } else {
                tracing::info!("Database integrity check passed");
            }
            !corrupt
        }
        Err(e) => {
            tracing::error!("Error executing integrity check PRAGMA: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maintenance::open_pool;

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_integrity(&dir.path().join("database.db")).await);
    }

    #[tokio::test]
    async fn garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        assert!(!check_integrity(&path).await);
        // The check must not modify what it inspects
        assert_eq!(std::fs::read(&path).unwrap(), vec![b'x'; 4096]);
    }

    #[tokio::test]
    async fn healthy_store_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.db");
        let pool = open_pool(&path, 1).await.unwrap();
        crate::maintenance::migrate(&pool).await.unwrap();
        pool.close().await;

        assert!(check_integrity(&path).await);
    }
}
