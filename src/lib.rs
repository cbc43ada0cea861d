//! Library entry point for the digital platform backend.
//!
//! Landowners post requirements, contractors apply to them. Exports all core
//! modules for use in integration tests and by the main binary.

pub mod auth_middleware;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use auth_middleware::{AuthMiddleware, UserContext};
pub use config::Settings;
pub use error::ApiError;
pub use handlers::configure_routes;
pub use logging::{get_subscriber, init_subscriber};
pub use models::*;
