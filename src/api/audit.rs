//! Audit log endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        audit_log::{AuditLogEntry, ClientErrorReport},
        visitor::Message,
    },
};

/// Report a crash in the desk client
#[utoipa::path(
    post,
    path = "/api/audit/log-error",
    tag = "audit",
    request_body = ClientErrorReport,
    responses(
        (status = 201, description = "Client error logged", body = Message),
        (status = 400, description = "Missing event_name, timestamp or status", body = crate::error::ErrorResponse)
    )
)]
pub async fn log_client_error(
    State(state): State<crate::AppState>,
    Json(report): Json<ClientErrorReport>,
) -> AppResult<(StatusCode, Json<Message>)> {
    state.services.audit.log_client_error(&report).await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("Client error logged successfully")),
    ))
}

/// Compliance cleanup audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/audit/history",
    tag = "audit",
    responses(
        (status = 200, description = "Audit rows", body = Vec<AuditLogEntry>)
    )
)]
pub async fn audit_history(State(state): State<crate::AppState>) -> AppResult<Json<Vec<AuditLogEntry>>> {
    let rows = state.services.audit.history().await?;
    Ok(Json(rows))
}
