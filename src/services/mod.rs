//! Service layer: credential hashing, token handling and attachment storage.

pub mod password;
pub mod token;
pub mod uploads;

use thiserror::Error;

pub use password::PasswordService;
pub use token::{Claims, IssuedToken, TokenService};
pub use uploads::UploadStore;

/// Failures while hashing passwords or handling access tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Failures while receiving or removing an attachment.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded file has no usable name")]
    MissingFilename,
    #[error("file extension `{0}` is not allowed")]
    ExtensionNotAllowed(String),
    #[error("file exceeds the {0} byte limit")]
    TooLarge(usize),
    #[error("upload stream failed: {0}")]
    Stream(String),
    #[error("upload io error: {0}")]
    Io(#[from] std::io::Error),
}
