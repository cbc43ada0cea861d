#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use common::{
    Part, bearer, context, context_with, create_requirement_req, encode_parts, multipart_req,
    seed_requirement, seed_user,
};
use digital_platform::{Role, handlers::data::CreatedResponse};
use serde_json::{Value, json};

fn stored_files(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[actix_web::test]
async fn test_requirement_lifecycle() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (owner_id, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let req = create_requirement_req(
        &token,
        &[("title", "Fence repair"), ("description", "200m of fencing"), ("location", "North field")],
        None,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CreatedResponse = test::read_body_json(resp).await;
    assert_eq!(created.message, "Requirement created");

    let req = test::TestRequest::get()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "Fence repair");
    assert_eq!(body["location"], "North field");
    assert_eq!(body["owner_id"], owner_id);
    assert!(body["attachment"].is_null());

    let req = test::TestRequest::put()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "Fence replacement" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/landowner/requirements")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Fence replacement");
    assert_eq!(list[0]["description"], "200m of fencing");

    let req = test::TestRequest::delete()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_requires_title_and_description() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    for fields in [
        vec![("description", "no title")],
        vec![("title", "no description")],
        vec![("title", "   "), ("description", "blank title")],
    ] {
        let req = create_requirement_req(&token, &fields, None).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn test_contractor_cannot_create_requirement() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "builder", Role::Contractor).await;

    let req = create_requirement_req(&token, &[("title", "t"), ("description", "d")], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_attachment_is_stored_and_removed() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let req = create_requirement_req(
        &token,
        &[("title", "Drainage"), ("description", "Survey attached")],
        Some(("../../site plan.pdf", &b"%PDF-1.4 test"[..])),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CreatedResponse = test::read_body_json(resp).await;

    let files = stored_files(ctx.upload_dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("site_plan.pdf"), "stored as {}", files[0]);
    let contents = std::fs::read(ctx.upload_dir.path().join(&files[0])).unwrap();
    assert_eq!(contents, b"%PDF-1.4 test");

    let req = test::TestRequest::get()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["attachment"], files[0].as_str());

    let req = test::TestRequest::delete()
        .uri(&format!("/landowner/requirement/{}", created.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());
}

#[actix_web::test]
async fn test_disallowed_extension_is_rejected() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let req = create_requirement_req(
        &token,
        &[("title", "Shed"), ("description", "Build a shed")],
        Some(("payload.exe", &b"MZ"[..])),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());
}

#[actix_web::test]
async fn test_oversized_attachment_is_rejected() {
    let ctx = context_with(|settings| settings.max_upload_bytes = 16);
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let req = create_requirement_req(
        &token,
        &[("title", "Barn"), ("description", "Plans attached")],
        Some(("plans.txt", &[b'x'; 64][..])),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());

    let req = test::TestRequest::get()
        .uri("/landowner/requirements")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_second_file_removes_first_upload() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let body = encode_parts(&[
        Part::Text("title", "Garage"),
        Part::Text("description", "Two plans"),
        Part::File("a.pdf", b"first"),
        Part::File("b.pdf", b"second"),
    ]);
    let resp = test::call_service(&app, multipart_req(&token, body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());
    assert!(ctx.state.store.list_requirements().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_long_text_field_after_file_removes_upload() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let long_title = "t".repeat(70 * 1024);
    let body = encode_parts(&[
        Part::File("a.pdf", b"plan"),
        Part::Text("title", &long_title),
        Part::Text("description", "Too wordy"),
    ]);
    let resp = test::call_service(&app, multipart_req(&token, body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());
    assert!(ctx.state.store.list_requirements().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_missing_field_after_file_removes_upload() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (_, token) = seed_user(&ctx.state, "landlord", Role::Landowner).await;

    let body = encode_parts(&[Part::Text("title", "Silo"), Part::File("a.pdf", b"plan")]);
    let resp = test::call_service(&app, multipart_req(&token, body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(stored_files(ctx.upload_dir.path()).is_empty());
}

#[actix_web::test]
async fn test_only_owner_may_modify() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (owner_id, _) = seed_user(&ctx.state, "owner", Role::Landowner).await;
    let (_, other) = seed_user(&ctx.state, "neighbour", Role::Landowner).await;
    let id = seed_requirement(&ctx.state, owner_id, "Well").await;

    let req = test::TestRequest::put()
        .uri(&format!("/landowner/requirement/{id}"))
        .insert_header(bearer(&other))
        .set_json(json!({ "title": "Mine now" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/landowner/requirement/{id}"))
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = ctx.state.store.get_requirement(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Well");
}

#[actix_web::test]
async fn test_update_edge_cases() {
    let ctx = context();
    let app = spawn_app!(ctx.state);
    let (owner_id, token) = seed_user(&ctx.state, "owner", Role::Landowner).await;
    let id = seed_requirement(&ctx.state, owner_id, "Pond").await;

    let req = test::TestRequest::put()
        .uri(&format!("/landowner/requirement/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/landowner/requirement/9999")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "Ghost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/landowner/requirement/not-a-number")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
