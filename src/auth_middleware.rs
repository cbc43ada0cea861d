//! Authentication extractor for bearer access tokens.
//!
//! # Overview
//! [`AuthMiddleware`] is an Actix Web extractor that injects a [`UserContext`]
//! into handlers. It reads `Authorization: Bearer <token>`, validates the token
//! signature and expiry, and loads the account from the store so tokens for
//! deleted users stop working immediately.
//!
//! # Usage
//! Add `user: AuthMiddleware` as a handler argument to require authentication.
//!
//! # Errors
//! Rejects with 401 when the header is missing or malformed, the token is
//! invalid or expired, or the account no longer exists.

use std::ops::Deref;

use actix_web::{FromRequest, HttpMessage, HttpRequest, http::header, web};
use futures::future::LocalBoxFuture;
use serde::Serialize;

use crate::{AppState, error::ApiError, models::Role};

/// The authenticated caller.
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Actix Web extractor for injecting [`UserContext`] into handlers.
#[derive(Debug, Clone)]
pub struct AuthMiddleware(pub UserContext);

impl Deref for AuthMiddleware {
    type Target = UserContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Pulls the raw token out of an `Authorization` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequest for AuthMiddleware {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let state = state.ok_or_else(|| ApiError::Internal("AppState missing".into()))?;

            let header = auth_header.ok_or_else(|| {
                tracing::debug!("No Authorization header present in request");
                ApiError::Unauthorized("missing authorization header".into())
            })?;
            let token = bearer_token(&header).ok_or_else(|| {
                tracing::debug!("Authorization header is not a bearer token");
                ApiError::Unauthorized("expected bearer token".into())
            })?;

            let claims = state.tokens.validate(token).map_err(|e| {
                tracing::warn!(error = %e, "Rejected access token");
                ApiError::from(e)
            })?;
            let user_id = claims.user_id().map_err(ApiError::from)?;

            let user = state
                .store
                .find_user(user_id)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| {
                    tracing::warn!(user_id, "Token refers to an unknown user");
                    ApiError::Unauthorized("invalid token".into())
                })?;

            let ctx = UserContext {
                id: user.id,
                username: user.username,
                role: user.role,
            };
            tracing::debug!(user_id = ctx.id, role = %ctx.role, "User authenticated");

            req.extensions_mut().insert(ctx.clone());
            Ok(AuthMiddleware(ctx))
        })
    }
}
