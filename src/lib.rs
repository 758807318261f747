//! Front Desk Server
//!
//! REST backend for a front-desk visitor tracker: registration, sign-in and
//! sign-out, bans, visit history, plus the store maintenance that keeps the
//! single-file database healthy (integrity check, daily snapshots and
//! retention cleanup).

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod models;
pub mod repository;
pub mod services;
pub mod status;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use status::{StatusSnapshot, StatusTracker};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub status: StatusTracker,
}
