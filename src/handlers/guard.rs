//! Role and ownership checks shared by the landowner and contractor handlers.

use crate::{auth_middleware::AuthMiddleware, error::ApiError, models::Role};

/// Rejects callers whose account role differs from `role` with 403.
pub fn require_role(user: &AuthMiddleware, role: Role) -> Result<(), ApiError> {
    if user.role == role {
        Ok(())
    } else {
        tracing::warn!(user_id = user.id, role = %user.role, required = %role, "Role check failed");
        Err(ApiError::Forbidden(format!("only a {role} may do this")))
    }
}

/// Rejects callers who do not own the record with 403.
pub fn require_owner(user: &AuthMiddleware, owner_id: i64, what: &str) -> Result<(), ApiError> {
    if user.id == owner_id {
        Ok(())
    } else {
        tracing::warn!(user_id = user.id, owner_id, what, "Ownership check failed");
        Err(ApiError::Forbidden(format!("you do not own this {what}")))
    }
}
