//! Request and response bodies shared by the HTTP handlers.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Role;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Returned by `POST /login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Returned by every create endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRequirementRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewApplicationRequest {
    pub requirement_id: i64,
    #[validate(length(min = 1, max = 10000))]
    pub proposal: String,
    #[validate(range(min = 0.0))]
    pub cost_estimation: f64,
    #[validate(range(min = 1))]
    pub estimated_duration_days: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateApplicationRequest {
    #[validate(length(min = 1, max = 10000))]
    pub proposal: Option<String>,
    #[validate(range(min = 0.0))]
    pub cost_estimation: Option<f64>,
    #[validate(range(min = 1))]
    pub estimated_duration_days: Option<i32>,
}

/// Query string of the sort endpoint. Parsed by hand so unknown columns get a
/// descriptive 400 instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Trims surrounding whitespace, mapping blank input to `None`.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
