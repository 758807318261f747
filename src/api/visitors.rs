//! Visitor registration, lookup and ban endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        dependent::DependentDetails,
        visit::{VisitDetails, DEFAULT_VISIT_TYPE},
        visitor::{
            ActiveVisitor, BanRequest, IdMessage, Message, PasswordRequest, RegisterVisitor,
            SearchQuery, VisitorSearchResult,
        },
    },
    services::visitors::PhotoUpload,
};

/// Multipart registration form
#[derive(Debug, Default, ToSchema)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub known_as: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub unit: String,
    pub reason_for_visit: Option<String>,
    /// Visitor, Contractor, Professional...
    pub r#type: Option<String>,
    pub company_name: Option<String>,
    /// "true", "1" or "on" when acknowledged
    pub mandatory_acknowledgment_taken: Option<String>,
    /// JSON array of `{full_name, age}`
    pub additional_dependents: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub photo: Option<PhotoUpload>,
}

impl RegistrationForm {
    async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = RegistrationForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photo" {
                let original_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid photo upload: {}", e)))?;
                form.photo = Some(PhotoUpload {
                    original_name,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field {}: {}", name, e)))?;
            let text = Some(value.trim().to_string()).filter(|v| !v.is_empty());

            match name.as_str() {
                "first_name" => form.first_name = text.unwrap_or_default(),
                "last_name" => form.last_name = text.unwrap_or_default(),
                "known_as" => form.known_as = text,
                "address" => form.address = text,
                "phone_number" => form.phone_number = text,
                "unit" => form.unit = text.unwrap_or_default(),
                "reason_for_visit" => form.reason_for_visit = text,
                "type" => form.r#type = text,
                "company_name" => form.company_name = text,
                "mandatory_acknowledgment_taken" => form.mandatory_acknowledgment_taken = text,
                "additional_dependents" => form.additional_dependents = text,
                other => tracing::debug!("Registration: ignoring unknown field {}", other),
            }
        }

        Ok(form)
    }

    fn into_registration(self) -> AppResult<(RegisterVisitor, Option<PhotoUpload>)> {
        let dependents = match self.additional_dependents.as_deref() {
            Some(raw) => serde_json::from_str::<Vec<DependentDetails>>(raw).map_err(|e| {
                AppError::BadRequest(format!("additional_dependents must be a JSON array: {}", e))
            })?,
            None => Vec::new(),
        };

        let acknowledged = matches!(
            self.mandatory_acknowledgment_taken.as_deref(),
            Some("true") | Some("1") | Some("on")
        );

        let registration = RegisterVisitor {
            first_name: self.first_name,
            last_name: self.last_name,
            details: VisitDetails {
                known_as: self.known_as,
                address: self.address,
                phone_number: self.phone_number,
                unit: self.unit,
                reason_for_visit: self.reason_for_visit,
                visit_type: self
                    .r#type
                    .unwrap_or_else(|| DEFAULT_VISIT_TYPE.to_string()),
                company_name: self.company_name,
                mandatory_acknowledgment_taken: acknowledged,
            },
            dependents,
            photo_path: None,
        };

        Ok((registration, self.photo))
    }
}

/// Register a new visitor and sign them in
#[utoipa::path(
    post,
    path = "/register-visitor",
    tag = "visitors",
    request_body(content = RegistrationForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Visitor registered and signed in", body = IdMessage),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 409, description = "A visitor with this name already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_visitor(
    State(state): State<crate::AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<IdMessage>)> {
    let form = RegistrationForm::from_multipart(multipart).await?;
    let (registration, photo) = form.into_registration()?;

    let id = state.services.visitors.register(registration, photo).await?;
    Ok((
        StatusCode::CREATED,
        Json(IdMessage {
            message: "Visitor registered successfully!".to_string(),
            id,
        }),
    ))
}

/// Visitors currently signed in
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    responses(
        (status = 200, description = "Active visits with visitor data", body = Vec<ActiveVisitor>)
    )
)]
pub async fn list_active_visitors(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<ActiveVisitor>>> {
    let visitors = state.services.visitors.list_active().await?;
    Ok(Json(visitors))
}

/// Search visitors by name
#[utoipa::path(
    get,
    path = "/visitor-search",
    tag = "visitors",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching visitors with their latest visit", body = Vec<VisitorSearchResult>),
        (status = 400, description = "Missing search term", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_visitors(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<VisitorSearchResult>>> {
    let results = state.services.visitors.search(query.name.as_deref()).await?;
    Ok(Json(results))
}

/// Ban a visitor
#[utoipa::path(
    post,
    path = "/ban-visitor",
    tag = "visitors",
    request_body = BanRequest,
    responses(
        (status = 200, description = "Visitor banned", body = IdMessage),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn ban_visitor(
    State(state): State<crate::AppState>,
    Json(request): Json<BanRequest>,
) -> AppResult<Json<IdMessage>> {
    let id = state.services.visitors.ban(request.visitor_id).await?;
    Ok(Json(IdMessage {
        message: "Visitor has been banned successfully.".to_string(),
        id,
    }))
}

/// Lift a visitor's ban
#[utoipa::path(
    post,
    path = "/unban-visitor/{id}",
    tag = "visitors",
    params(("id" = i64, Path, description = "Visitor ID")),
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Visitor unbanned", body = Message),
        (status = 403, description = "Incorrect password", body = crate::error::ErrorResponse),
        (status = 404, description = "Visitor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn unban_visitor(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PasswordRequest>,
) -> AppResult<Json<Message>> {
    state
        .services
        .visitors
        .unban(id, request.password.as_deref())
        .await?;
    Ok(Json(Message::new("Visitor has been unbanned successfully.")))
}
