//! Front Desk Server - visitor tracking backend

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::{non_blocking::WorkerGuard, rolling::{RollingFileAppender, Rotation}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use frontdesk_server::{
    api,
    config::AppConfig,
    maintenance,
    repository::Repository,
    services::Services,
    AppState, StatusTracker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config)?;

    tracing::info!("Starting Front Desk Server v{}", env!("CARGO_PKG_VERSION"));
    config.warn_on_empty_passwords();

    let uploads_dir = config.uploads_dir();
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .with_context(|| format!("Failed to create uploads directory {}", uploads_dir.display()))?;

    let status = StatusTracker::new();
    let pool = maintenance::prepare_store(&config, &status).await;
    let snapshot = status.snapshot().await;
    tracing::info!(
        db_ready = snapshot.db_ready,
        last_backup = %snapshot.last_backup,
        last_cleanup = %snapshot.last_cleanup,
        "Store prepared"
    );

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.admin.clone(), uploads_dir, status.clone());

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        status,
    };

    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Console output plus daily-rotated JSON files under the data directory
fn init_tracing(config: &AppConfig) -> anyhow::Result<WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("frontdesk_server={},tower_http=info", config.logging.level).into()
        })
    };

    let logs_dir = config.logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("application")
        .filename_suffix("log")
        .max_log_files(config.logging.max_log_files.max(1))
        .build(&logs_dir)
        .context("Failed to create rolling log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console = if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let file = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(console.with_filter(filter()))
        .with(file.with_filter(filter()))
        .init();

    Ok(guard)
}
