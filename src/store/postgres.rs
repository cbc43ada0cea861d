//! Postgres-backed store using runtime-checked SQLx queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    ApplicationOrder, ApplicationPatch, NewApplication, NewRequirement, NewUser, PlatformStore,
    RequirementPatch, StoreError,
};
use crate::models::{Application, Requirement, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";
const REQUIREMENT_COLUMNS: &str =
    "id, owner_id, title, description, location, attachment, created_at, updated_at";
const APPLICATION_COLUMNS: &str = "id, requirement_id, contractor_id, proposal, cost_estimation, \
     estimated_duration_days, created_at, updated_at";

// Postgres SQLSTATE codes.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps constraint violations to domain errors; everything else is a database error.
fn classify(err: sqlx::Error, conflict: &str, reference: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::Conflict(conflict.to_string()),
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::MissingReference(reference),
            _ => {}
        }
    }
    StoreError::from(err)
}

#[async_trait]
impl PlatformStore for PgStore {
    #[tracing::instrument(skip(self, new), fields(username = %new.username))]
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(new.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "username", "user"))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    #[tracing::instrument(skip(self, new), fields(owner_id = new.owner_id))]
    async fn create_requirement(&self, new: NewRequirement) -> Result<Requirement, StoreError> {
        let sql = format!(
            "INSERT INTO requirements (owner_id, title, description, location, attachment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REQUIREMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Requirement>(&sql)
            .bind(new.owner_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.location)
            .bind(&new.attachment)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "requirement", "user"))
    }

    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        let sql = format!("SELECT {REQUIREMENT_COLUMNS} FROM requirements ORDER BY id");
        Ok(sqlx::query_as::<_, Requirement>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError> {
        let sql = format!("SELECT {REQUIREMENT_COLUMNS} FROM requirements WHERE id = $1");
        Ok(sqlx::query_as::<_, Requirement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_requirement(
        &self,
        id: i64,
        patch: RequirementPatch,
    ) -> Result<Option<Requirement>, StoreError> {
        let sql = format!(
            "UPDATE requirements SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                location = COALESCE($4, location), \
                updated_at = now() \
             WHERE id = $1 RETURNING {REQUIREMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Requirement>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.location)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError> {
        // applications go with it via ON DELETE CASCADE
        let sql = format!("DELETE FROM requirements WHERE id = $1 RETURNING {REQUIREMENT_COLUMNS}");
        Ok(sqlx::query_as::<_, Requirement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    #[tracing::instrument(skip(self, new), fields(requirement_id = new.requirement_id))]
    async fn create_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        let sql = format!(
            "INSERT INTO applications \
                (requirement_id, contractor_id, proposal, cost_estimation, estimated_duration_days) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(new.requirement_id)
            .bind(new.contractor_id)
            .bind(&new.proposal)
            .bind(new.cost_estimation)
            .bind(new.estimated_duration_days)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "application", "requirement"))
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        Ok(sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_applications(
        &self,
        requirement_id: i64,
        order: Option<ApplicationOrder>,
    ) -> Result<Vec<Application>, StoreError> {
        // Only whitelisted column names ever reach the ORDER BY clause.
        let order_by = match order {
            Some(o) => format!(
                "{} {} NULLS LAST, id ASC",
                o.field.column(),
                o.order.keyword()
            ),
            None => "id ASC".to_string(),
        };
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE requirement_id = $1 \
             ORDER BY {order_by}"
        );
        Ok(sqlx::query_as::<_, Application>(&sql)
            .bind(requirement_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_application(
        &self,
        id: i64,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>, StoreError> {
        let sql = format!(
            "UPDATE applications SET \
                proposal = COALESCE($2, proposal), \
                cost_estimation = COALESCE($3, cost_estimation), \
                estimated_duration_days = COALESCE($4, estimated_duration_days), \
                updated_at = now() \
             WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(patch.proposal)
            .bind(patch.cost_estimation)
            .bind(patch.estimated_duration_days)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_application(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
