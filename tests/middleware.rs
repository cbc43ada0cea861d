#[macro_use]
mod common;

use std::time::Duration;

use actix_web::{http::StatusCode, test};
use common::{bearer, context, seed_user};
use digital_platform::{Role, handlers::data::MessageResponse, services::TokenService};

const PROTECTED: [&str; 4] = [
    "/user/profile",
    "/landowner/requirements",
    "/landowner/requirement/1",
    "/contractor/applications/1",
];

#[actix_web::test]
async fn test_protected_routes_reject_missing_token() {
    let ctx = context();
    let app = spawn_app!(ctx.state);

    for uri in PROTECTED {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
        let body: MessageResponse = test::read_body_json(resp).await;
        assert!(!body.message.is_empty());
    }
}

#[actix_web::test]
async fn test_rejects_malformed_and_foreign_tokens() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (id, _) = seed_user(&ctx.state, "mallory", Role::Contractor).await;

    let foreign = TokenService::new(b"some-other-secret", Duration::from_secs(60))
        .issue(id, Role::Contractor)
        .unwrap()
        .token;

    for header in [
        "Bearer not-a-jwt".to_string(),
        format!("Basic {foreign}"),
        format!("Bearer {foreign}"),
        "Bearer ".to_string(),
    ] {
        let req = test::TestRequest::get()
            .uri("/user/profile")
            .insert_header(("Authorization", header.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header: {header}");
    }
}

#[actix_web::test]
async fn test_token_for_unknown_user_is_rejected() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let token = ctx.state.tokens.issue(4242, Role::Landowner).unwrap().token;

    let req = test::TestRequest::get()
        .uri("/user/profile")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_request_id_header() {
    let ctx = context();
    let app = spawn_app!(ctx.state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    let generated = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-request-id", "trace-abc-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "trace-abc-1");

    // errors carry the header too
    let req = test::TestRequest::get().uri("/user/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));
}
