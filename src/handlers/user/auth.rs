//! Account registration and login.
//!
//! Passwords are hashed with Argon2id on the blocking pool; login answers with
//! a signed bearer token.

use actix_web::{HttpResponse, web};
use validator::Validate;

use crate::{
    AppState,
    error::ApiError,
    handlers::data::{CreatedResponse, LoginRequest, RegisterRequest, TokenResponse},
    store::NewUser,
};

const BAD_CREDENTIALS: &str = "invalid username or password";

/// Registers a new account.
///
/// # Request Body (JSON)
/// ```json
/// { "username": "olive", "password": "correct horse", "role": "landowner" }
/// ```
///
/// # Responses
/// - `201 Created`: `{ "message": "User registered", "id": 1 }`
/// - `400 Bad Request`: missing or invalid fields
/// - `409 Conflict`: username already taken
#[tracing::instrument(skip(state, form), fields(username = %form.username, role = %form.role))]
pub async fn register(
    state: web::Data<AppState>,
    form: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.username = form.username.trim().to_string();
    form.validate()?;

    tracing::info!("Attempting user registration");

    let passwords = state.passwords.clone();
    let password = form.password;
    let password_hash = web::block(move || passwords.hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let user = state
        .store
        .create_user(NewUser {
            username: form.username,
            password_hash,
            role: form.role,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registration completed successfully");

    Ok(HttpResponse::Created().json(CreatedResponse {
        message: "User registered".into(),
        id: user.id,
    }))
}

/// Exchanges a username and password for an access token.
///
/// # Responses
/// - `200 OK`: `{ "access_token": "...", "token_type": "Bearer", "expires_in": 3600 }`
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: unknown user or wrong password (same message for both)
#[tracing::instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    state: web::Data<AppState>,
    form: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();
    form.validate()?;

    let Some(user) = state.store.find_user_by_username(form.username.trim()).await? else {
        tracing::warn!("Login for unknown user");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    let passwords = state.passwords.clone();
    let stored_hash = user.password_hash.clone();
    let password = form.password;
    let valid = web::block(move || passwords.verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    if !valid {
        tracing::warn!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let issued = state.tokens.issue(user.id, user.role)?;
    tracing::info!(user_id = user.id, "User login successful");

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: issued.token,
        token_type: "Bearer".into(),
        expires_in: issued.expires_in,
    }))
}
