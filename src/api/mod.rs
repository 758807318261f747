//! API handlers for the front desk REST endpoints

pub mod audit;
pub mod health;
pub mod history;
pub mod openapi;
pub mod visitors;
pub mod visits;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::AppState;

/// Slack on top of the photo limit for the text fields of a registration
const FORM_FIELDS_ALLOWANCE: usize = 64 * 1024;

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let registration_limit = state.config.uploads.max_photo_bytes + FORM_FIELDS_ALLOWANCE;
    let uploads = ServeDir::new(state.config.uploads_dir());

    // System routes live under /api; the desk client calls the visitor routes at the root
    let system = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/status", get(health::system_status))
        // Audit
        .route("/audit/log-error", post(audit::log_client_error))
        .route("/audit/history", get(audit::audit_history));

    let desk = Router::new()
        // Visitors
        .route(
            "/register-visitor",
            post(visitors::register_visitor).layer(DefaultBodyLimit::max(registration_limit)),
        )
        .route("/visitors", get(visitors::list_active_visitors))
        .route("/visitor-search", get(visitors::search_visitors))
        .route("/ban-visitor", post(visitors::ban_visitor))
        .route("/unban-visitor/:id", post(visitors::unban_visitor))
        // Visits
        .route("/login", post(visits::sign_in))
        .route("/update-visitor-details", post(visits::update_visitor_details))
        .route("/exit-visitor/:id", post(visits::sign_out))
        .route("/record-missed-visit", post(visits::record_missed_visit))
        // History
        .route("/authorize-history", post(history::authorize_history))
        .route("/history", get(history::get_history));

    Router::new()
        .nest("/api", system)
        .merge(desk)
        .with_state(state)
        .nest_service("/uploads", uploads)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
