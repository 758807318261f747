//! Dependent model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A minor accompanying a visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DependentDetails {
    #[validate(length(min = 1, message = "Dependent name is required"))]
    pub full_name: String,
    #[validate(range(min = 0, max = 150, message = "Dependent age must be between 0 and 150"))]
    pub age: i64,
}
