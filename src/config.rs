//! Configuration management for the front desk server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::maintenance::{BACKUP_RETENTION_DAYS, DATA_RETENTION_DAYS};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the store, its backups, logs and uploads
    pub data_dir: PathBuf,
    /// File name of the live store inside `data_dir`
    pub database_file: String,
    pub max_connections: u32,
}

/// Shared-secret passwords gating the history view and unbanning
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub history_password: String,
    pub unban_password: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    pub data_retention_days: i64,
    pub backup_retention_days: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Console format: `pretty` or `json`. Files are always JSON.
    pub format: String,
    pub max_log_files: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadsConfig {
    pub max_photo_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
    pub uploads: UploadsConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables, e.g. FRONTDESK__SERVER__PORT=3002
            .add_source(
                Environment::with_prefix("FRONTDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.data_dir", env::var("DATA_DIR").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("admin.history_password", env::var("ADMIN_PASSWORD_1").ok())?
            .set_override_option("admin.unban_password", env::var("ADMIN_PASSWORD_2").ok())?
            .build()?;

        config.try_deserialize()
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database_file)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.storage.data_dir.join("uploads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.storage.data_dir.join("logs")
    }

    /// Log a warning for every admin password left empty
    pub fn warn_on_empty_passwords(&self) {
        if self.admin.history_password.trim().is_empty() {
            tracing::warn!("SECURITY ALERT: history password (ADMIN_PASSWORD_1) is empty, history access is locked");
        }
        if self.admin.unban_password.trim().is_empty() {
            tracing::warn!("SECURITY ALERT: unban password (ADMIN_PASSWORD_2) is empty, unbanning is locked");
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_file: "database.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            data_retention_days: DATA_RETENTION_DAYS,
            backup_retention_days: BACKUP_RETENTION_DAYS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            max_log_files: 60,
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_photo_bytes: 20 * 1024 * 1024,
        }
    }
}
