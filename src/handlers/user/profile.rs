//! Profile of the authenticated account.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth_middleware::AuthMiddleware,
    error::ApiError,
    models::Role,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// `GET /user/profile`
#[tracing::instrument(skip(user, state), fields(user_id = user.id))]
pub async fn get_profile(
    user: AuthMiddleware,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let account = state
        .store
        .find_user(user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("account no longer exists".into()))?;

    Ok(HttpResponse::Ok().json(UserProfile {
        id: account.id,
        username: account.username,
        role: account.role,
        created_at: account.created_at,
    }))
}
