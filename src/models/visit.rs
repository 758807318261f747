//! Visit model and related request/response types

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::dependent::DependentDetails;

/// Placeholder stored when a detail is unknown
pub const UNKNOWN_DETAIL: &str = "--";

/// Visit type recorded when none is known
pub const DEFAULT_VISIT_TYPE: &str = "Visitor";

/// Descriptive fields carried by every visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct VisitDetails {
    pub known_as: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    /// Unit being visited
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    pub reason_for_visit: Option<String>,
    /// Visitor, Contractor, Professional...
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[validate(length(min = 1, message = "Visit type is required"))]
    pub visit_type: String,
    pub company_name: Option<String>,
    #[serde(default)]
    pub mandatory_acknowledgment_taken: bool,
}

impl Default for VisitDetails {
    fn default() -> Self {
        Self {
            known_as: None,
            address: None,
            phone_number: None,
            unit: UNKNOWN_DETAIL.to_string(),
            reason_for_visit: None,
            visit_type: DEFAULT_VISIT_TYPE.to_string(),
            company_name: None,
            mandatory_acknowledgment_taken: false,
        }
    }
}

/// Sign-in request for a returning visitor
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub id: Option<i64>,
}

/// Sign-in response, echoing the details copied into the new visit
#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub message: String,
    pub visit_id: i64,
    pub details: VisitDetails,
    pub dependents: Vec<DependentDetails>,
}

/// New details for a returning visitor, signing them in
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVisitorDetails {
    pub id: Option<i64>,
    #[serde(flatten)]
    #[validate(nested)]
    pub details: VisitDetails,
    #[serde(default)]
    #[validate(nested)]
    pub additional_dependents: Vec<DependentDetails>,
}

/// Correction for a visit that was never signed in
#[derive(Debug, Deserialize, ToSchema)]
pub struct MissedVisitRequest {
    #[serde(rename = "visitorId")]
    pub visitor_id: Option<i64>,
    /// RFC 3339 time the visitor actually arrived
    #[serde(rename = "pastEntryTime")]
    pub past_entry_time: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MissedVisitResponse {
    pub message: String,
    pub entry: String,
    pub exit: String,
}

/// Filters for the visit history
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Case-insensitive match on first or last name
    pub search: Option<String>,
    /// Earliest entry date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Latest entry date, inclusive (YYYY-MM-DD)
    pub end_date: Option<String>,
}

/// One visit with its visitor, as shown in the history view
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct HistoryEntry {
    pub visitor_id: i64,
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
