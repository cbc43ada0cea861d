//! Persistence boundary for users, requirements and applications.
//!
//! Handlers only talk to [`PlatformStore`]. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process and is used for tests
//! and for running without a database.

pub mod memory;
pub mod postgres;

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Application, Requirement, Role, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Database(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewRequirement {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub attachment: Option<String>,
}

/// Field-by-field requirement update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct RequirementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl RequirementPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub requirement_id: i64,
    pub contractor_id: i64,
    pub proposal: String,
    pub cost_estimation: f64,
    pub estimated_duration_days: Option<i32>,
}

/// Field-by-field application update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub proposal: Option<String>,
    pub cost_estimation: Option<f64>,
    pub estimated_duration_days: Option<i32>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.proposal.is_none()
            && self.cost_estimation.is_none()
            && self.estimated_duration_days.is_none()
    }
}

/// Columns applications may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CostEstimation,
    EstimatedDurationDays,
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 3] = [
        SortField::CostEstimation,
        SortField::EstimatedDurationDays,
        SortField::CreatedAt,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CostEstimation => "cost_estimation",
            SortField::EstimatedDurationDays => "estimated_duration_days",
            SortField::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.column() == value)
            .ok_or_else(|| {
                let allowed: Vec<_> = SortField::ALL.iter().map(|f| f.column()).collect();
                format!(
                    "cannot sort by `{value}`; expected one of: {}",
                    allowed.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order `{other}`; expected asc or desc")),
        }
    }
}

/// Ordering for application listings. Missing values sort last in either
/// direction and ties fall back to ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplicationOrder {
    pub field: SortField,
    pub order: SortOrder,
}

#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the username is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::MissingReference`] when the owner is unknown.
    async fn create_requirement(&self, new: NewRequirement) -> Result<Requirement, StoreError>;
    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError>;
    async fn get_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError>;
    async fn update_requirement(
        &self,
        id: i64,
        patch: RequirementPatch,
    ) -> Result<Option<Requirement>, StoreError>;
    /// Removes the requirement and its applications, returning the deleted row.
    async fn delete_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError>;

    /// Fails with [`StoreError::MissingReference`] when the requirement or the
    /// contractor is unknown.
    async fn create_application(&self, new: NewApplication) -> Result<Application, StoreError>;
    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError>;
    /// Applications for one requirement; id order unless `order` is given.
    async fn list_applications(
        &self,
        requirement_id: i64,
        order: Option<ApplicationOrder>,
    ) -> Result<Vec<Application>, StoreError>;
    async fn update_application(
        &self,
        id: i64,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>, StoreError>;
    async fn delete_application(&self, id: i64) -> Result<bool, StoreError>;
}
