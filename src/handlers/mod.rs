//! HTTP handlers and route registration.
//!
//! Route layout:
//! ```text
//! GET    /health
//! POST   /register
//! POST   /login
//! GET    /user/profile
//! POST   /landowner/requirement                      (multipart)
//! GET    /landowner/requirements
//! GET    /landowner/requirement/{id}
//! PUT    /landowner/requirement/{id}
//! DELETE /landowner/requirement/{id}
//! POST   /contractor/application
//! GET    /contractor/applications/{requirement_id}
//! GET    /contractor/applications/sort/{requirement_id}
//! PUT    /contractor/application/{id}
//! DELETE /contractor/application/{id}
//! ```

pub mod contractor;
pub mod data;
pub mod guard;
pub mod health;
pub mod landowner;
pub mod user;

use actix_web::web;

use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Registers every route plus the extractor configs that turn malformed
/// JSON, query strings and path ids into `{"message": ...}` errors.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .route("/health", web::get().to(health::health_check))
        // Accounts
        .route("/register", web::post().to(user::register))
        .route("/login", web::post().to(user::login))
        .route("/user/profile", web::get().to(user::get_profile))
        // Landowner requirements
        .service(
            web::scope("/landowner")
                .route("/requirement", web::post().to(landowner::create_requirement))
                .route("/requirements", web::get().to(landowner::list_requirements))
                .route("/requirement/{id}", web::get().to(landowner::get_requirement))
                .route("/requirement/{id}", web::put().to(landowner::update_requirement))
                .route("/requirement/{id}", web::delete().to(landowner::delete_requirement)),
        )
        // Contractor applications
        .service(
            web::scope("/contractor")
                .route("/application", web::post().to(contractor::create_application))
                .route(
                    "/applications/sort/{requirement_id}",
                    web::get().to(contractor::sort_applications),
                )
                .route(
                    "/applications/{requirement_id}",
                    web::get().to(contractor::list_applications),
                )
                .route("/application/{id}", web::put().to(contractor::update_application))
                .route("/application/{id}", web::delete().to(contractor::delete_application)),
        );
}
