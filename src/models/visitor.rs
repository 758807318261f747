//! Visitor model and related request/response types

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{dependent::DependentDetails, visit::VisitDetails};

/// Visitor identity record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visitor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Relative path of the photo under the uploads route
    pub photo_path: Option<String>,
    pub is_banned: bool,
}

/// Registration of a new visitor together with their first visit
#[derive(Debug, Validate)]
pub struct RegisterVisitor {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(nested)]
    pub details: VisitDetails,
    #[validate(nested)]
    pub dependents: Vec<DependentDetails>,
    pub photo_path: Option<String>,
}

/// A visitor currently on site
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActiveVisitor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo_path: Option<String>,
    pub is_banned: bool,
    pub visit_id: i64,
    pub entry_time: String,
    pub exit_time: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: VisitDetails,
    #[schema(value_type = Vec<DependentDetails>)]
    pub dependents: Json<Vec<DependentDetails>>,
}

/// Search hit with the details of the visitor's latest visit, if any
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct VisitorSearchResult {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub photo_path: Option<String>,
    pub is_banned: bool,
    pub known_as: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub unit: Option<String>,
    pub reason_for_visit: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub visit_type: Option<String>,
    pub company_name: Option<String>,
    pub mandatory_acknowledgment_taken: bool,
    /// True while the visitor has an open visit
    pub signed_in: bool,
    #[schema(value_type = Vec<DependentDetails>)]
    pub dependents: Json<Vec<DependentDetails>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Whitespace separated terms, each matching first or last name
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BanRequest {
    pub visitor_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

/// Response carrying a confirmation message and the affected id
#[derive(Debug, Serialize, ToSchema)]
pub struct IdMessage {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
