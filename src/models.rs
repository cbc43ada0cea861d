//! Data models for users, requirements and applications.
//!
//! Models derive Serde and SQLx traits so the same struct maps a database row
//! and serializes straight into an API response.

use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    config::Settings,
    db,
    services::{PasswordService, TokenService, UploadStore},
    store::{MemoryStore, PgStore, PlatformStore},
};

/// Which side of the platform an account acts on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    /// Posts requirements.
    Landowner,
    /// Applies to requirements.
    Contractor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Landowner => "landowner",
            Role::Contractor => "contractor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "landowner" => Ok(Role::Landowner),
            "contractor" => Ok(Role::Contractor),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string; never leaves the server.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A need posted by a landowner.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Requirement {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    /// Stored file name of the attachment, relative to the upload directory.
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A contractor's response to a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub requirement_id: i64,
    pub contractor_id: i64,
    pub proposal: String,
    pub cost_estimation: f64,
    pub estimated_duration_days: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlatformStore>,
    pub settings: Arc<Settings>,
    pub passwords: Arc<PasswordService>,
    pub tokens: Arc<TokenService>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    /// Creates the state from resolved settings.
    ///
    /// Connects to Postgres and applies migrations when `database_url` is set,
    /// otherwise falls back to the in-memory store. The upload directory is
    /// created if missing.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn PlatformStore> = match &settings.database_url {
            Some(url) => {
                let pool = db::connect_pg_pool(url, settings.db_max_connections).await?;
                db::run_migrations(&pool).await?;
                Arc::new(PgStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::default())
            }
        };

        tokio::fs::create_dir_all(&settings.upload_dir).await?;

        Ok(Self::with_store(store, settings))
    }

    /// Builds the state around an existing store without touching the network.
    pub fn with_store(store: Arc<dyn PlatformStore>, settings: Settings) -> Self {
        let tokens = TokenService::new(settings.jwt_secret.as_bytes(), settings.token_ttl);
        let passwords =
            PasswordService::new(settings.argon2_memory_kib, settings.argon2_iterations);
        let uploads = UploadStore::new(
            settings.upload_dir.clone(),
            settings.max_upload_bytes,
            settings.allowed_extensions.clone(),
        );
        Self {
            store,
            passwords: Arc::new(passwords),
            tokens: Arc::new(tokens),
            uploads: Arc::new(uploads),
            settings: Arc::new(settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Landowner".parse::<Role>(), Ok(Role::Landowner));
        assert_eq!(" contractor ".parse::<Role>(), Ok(Role::Contractor));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Landowner,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "landowner");
    }
}
