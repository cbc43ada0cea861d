//! Password hashing with Argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, warn};

use crate::services::AuthError;

/// Hashes and verifies account passwords.
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Builds an Argon2id hasher with the given memory cost (KiB) and iteration
    /// count. Parameters outside Argon2's accepted range fall back to the
    /// library defaults.
    pub fn new(memory_kib: u32, iterations: u32) -> Self {
        let params = Params::new(memory_kib, iterations, 1, None).unwrap_or_else(|e| {
            warn!(error = %e, memory_kib, iterations, "Invalid Argon2 params, using defaults");
            Params::default()
        });
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes a password into a PHC string with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    /// Checks a password against a stored PHC string.
    ///
    /// Returns `Ok(false)` on mismatch; a malformed stored hash is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        let params = Params::default();
        Self::new(params.m_cost(), params.t_cost())
    }
}
