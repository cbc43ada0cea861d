//! Request tracing helpers for the HTTP layer.

pub mod middleware;

use actix_web::http::header::HeaderValue;
use uuid::Uuid;

pub use middleware::RequestLoggingMiddleware;

/// Longest caller-supplied request id that is passed through unchanged.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses a well-formed incoming `x-request-id`, otherwise generates a UUID.
pub fn request_id(incoming: Option<&HeaderValue>) -> String {
    incoming
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
