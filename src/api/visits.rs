//! Sign-in, sign-out and missed visit endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        visit::{MissedVisitRequest, MissedVisitResponse, SignInRequest, SignInResponse, UpdateVisitorDetails},
        visitor::{IdMessage, Message},
    },
};

/// Sign a returning visitor in with their previous details
#[utoipa::path(
    post,
    path = "/login",
    tag = "visits",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Visitor signed in", body = SignInResponse),
        (status = 403, description = "Visitor is banned", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visitor is already signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<crate::AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let response = state.services.visits.sign_in(request.id).await?;
    Ok(Json(response))
}

/// Sign a returning visitor in with new details and dependents
#[utoipa::path(
    post,
    path = "/update-visitor-details",
    tag = "visits",
    request_body = UpdateVisitorDetails,
    responses(
        (status = 201, description = "Visitor updated and signed in", body = IdMessage),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Visitor is banned", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visitor is already signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_visitor_details(
    State(state): State<crate::AppState>,
    Json(update): Json<UpdateVisitorDetails>,
) -> AppResult<(StatusCode, Json<IdMessage>)> {
    let visit_id = state.services.visits.update_details(&update).await?;
    Ok((
        StatusCode::CREATED,
        Json(IdMessage {
            message: "Visitor updated successfully and signed in!".to_string(),
            id: visit_id,
        }),
    ))
}

/// Sign a visitor out
#[utoipa::path(
    post,
    path = "/exit-visitor/{id}",
    tag = "visits",
    params(("id" = i64, Path, description = "Visitor ID")),
    responses(
        (status = 200, description = "Visitor signed out", body = Message),
        (status = 404, description = "No active visit for this visitor", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_out(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Message>> {
    let message = state.services.visits.sign_out(id).await?;
    Ok(Json(Message::new(message)))
}

/// Record a completed visit that was never signed in
#[utoipa::path(
    post,
    path = "/record-missed-visit",
    tag = "visits",
    request_body = MissedVisitRequest,
    responses(
        (status = 200, description = "Missed visit recorded", body = MissedVisitResponse),
        (status = 400, description = "Missing or invalid entry time", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_missed_visit(
    State(state): State<crate::AppState>,
    Json(request): Json<MissedVisitRequest>,
) -> AppResult<Json<MissedVisitResponse>> {
    let response = state.services.visits.record_missed(&request).await?;
    Ok(Json(response))
}
