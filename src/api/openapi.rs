//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{audit, health, history, visitors, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Front Desk API",
        version = "1.0.0",
        description = "Visitor sign-in, history and compliance REST API"
    ),
    servers(
        (url = "/", description = "Front desk server")
    ),
    paths(
        // Health
        health::health_check,
        health::system_status,
        // Visitors
        visitors::register_visitor,
        visitors::list_active_visitors,
        visitors::search_visitors,
        visitors::ban_visitor,
        visitors::unban_visitor,
        // Visits
        visits::sign_in,
        visits::update_visitor_details,
        visits::sign_out,
        visits::record_missed_visit,
        // History
        history::authorize_history,
        history::get_history,
        // Audit
        audit::log_client_error,
        audit::audit_history,
    ),
    components(
        schemas(
            // Visitors
            crate::models::visitor::Visitor,
            crate::models::visitor::ActiveVisitor,
            crate::models::visitor::VisitorSearchResult,
            crate::models::visitor::BanRequest,
            crate::models::visitor::PasswordRequest,
            crate::models::visitor::IdMessage,
            crate::models::visitor::Message,
            visitors::RegistrationForm,
            // Visits
            crate::models::visit::VisitDetails,
            crate::models::visit::SignInRequest,
            crate::models::visit::SignInResponse,
            crate::models::visit::UpdateVisitorDetails,
            crate::models::visit::MissedVisitRequest,
            crate::models::visit::MissedVisitResponse,
            crate::models::visit::HistoryEntry,
            crate::models::dependent::DependentDetails,
            // Audit
            crate::models::audit_log::AuditLogEntry,
            crate::models::audit_log::ClientErrorReport,
            // Health
            health::HealthResponse,
            crate::status::StatusSnapshot,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness and system status"),
        (name = "visitors", description = "Visitor registration, search and bans"),
        (name = "visits", description = "Sign-in and sign-out"),
        (name = "history", description = "Visit history dashboard"),
        (name = "audit", description = "Compliance audit trail and client error reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
