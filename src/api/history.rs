//! Visit history endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        visit::{HistoryEntry, HistoryQuery},
        visitor::{Message, PasswordRequest},
    },
};

/// Unlock the history dashboard
#[utoipa::path(
    post,
    path = "/authorize-history",
    tag = "history",
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Authorization successful", body = Message),
        (status = 403, description = "Incorrect password", body = crate::error::ErrorResponse)
    )
)]
pub async fn authorize_history(
    State(state): State<crate::AppState>,
    Json(request): Json<PasswordRequest>,
) -> AppResult<Json<Message>> {
    state
        .services
        .visits
        .authorize_history(request.password.as_deref())?;
    Ok(Json(Message::new("Authorization successful.")))
}

/// All visits, newest first, optionally filtered by name and entry date
#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Visit history", body = Vec<HistoryEntry>),
        (status = 400, description = "Malformed date filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<crate::AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    let rows = state.services.visits.history(&query).await?;
    Ok(Json(rows))
}
