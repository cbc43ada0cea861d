//! Shared fixtures for the endpoint tests.
//!
//! Every test gets its own in-memory store and temporary upload directory.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{http::header, test::TestRequest};
use digital_platform::{
    AppState, Role, Settings,
    store::{MemoryStore, NewUser},
};
use tempfile::TempDir;

pub const BOUNDARY: &str = "----digital-platform-test-boundary";

/// Spins up a fully wired app for `$state`.
macro_rules! spawn_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .wrap(digital_platform::telemetry::RequestLoggingMiddleware::new())
                .configure(digital_platform::configure_routes),
        )
        .await
    };
}

pub struct TestContext {
    pub state: AppState,
    pub upload_dir: TempDir,
}

pub fn context() -> TestContext {
    context_with(|_| {})
}

pub fn context_with(tweak: impl FnOnce(&mut Settings)) -> TestContext {
    let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
    let mut settings = Settings::for_testing(upload_dir.path());
    tweak(&mut settings);
    let state = AppState::with_store(Arc::new(MemoryStore::default()), settings);
    TestContext { state, upload_dir }
}

/// Creates an account directly in the store and returns its id and a token.
pub async fn seed_user(state: &AppState, username: &str, role: Role) -> (i64, String) {
    let password_hash = state
        .passwords
        .hash_password("password123")
        .expect("hashing failed");
    let user = state
        .store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            role,
        })
        .await
        .expect("seeding user failed");
    let token = state.tokens.issue(user.id, role).expect("token issue failed");
    (user.id, token.token)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// One part of a `multipart/form-data` body, encoded in the order given.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    /// A `file` part with its client file name.
    File(&'a str, &'a [u8]),
}

pub fn encode_parts(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        match part {
            Part::Text(name, value) => body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            ),
            Part::File(filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Encodes text fields followed by an optional `(filename, bytes)` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut parts: Vec<Part<'_>> = fields
        .iter()
        .map(|(name, value)| Part::Text(*name, *value))
        .collect();
    if let Some((filename, bytes)) = file {
        parts.push(Part::File(filename, bytes));
    }
    encode_parts(&parts)
}

/// `POST /landowner/requirement` with a multipart form.
pub fn create_requirement_req(
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> TestRequest {
    multipart_req(token, multipart_body(fields, file))
}

/// `POST /landowner/requirement` with an already encoded multipart body.
pub fn multipart_req(token: &str, body: Vec<u8>) -> TestRequest {
    TestRequest::post()
        .uri("/landowner/requirement")
        .insert_header(bearer(token))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

/// Inserts a requirement through the store, bypassing HTTP.
pub async fn seed_requirement(state: &AppState, owner_id: i64, title: &str) -> i64 {
    state
        .store
        .create_requirement(digital_platform::store::NewRequirement {
            owner_id,
            title: title.to_string(),
            description: format!("{title} description"),
            location: None,
            attachment: None,
        })
        .await
        .expect("seeding requirement failed")
        .id
}
