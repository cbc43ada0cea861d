//! Runtime configuration for the platform server.
//!
//! All settings come from environment variables (optionally loaded from `.env`
//! by the binary). Only `JWT_SECRET` is mandatory; everything else has a default
//! suitable for local development.

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// Upload size cap applied when `MAX_UPLOAD_BYTES` is not set (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Longest accepted `TOKEN_TTL` (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// File extensions accepted for requirement attachments by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "doc", "docx", "txt"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// HMAC secret used to sign access tokens.
    pub jwt_secret: String,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
    /// Directory where requirement attachments are written.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl = match get("TOKEN_TTL") {
            Some(raw) => humantime::parse_duration(&raw).map_err(|e| ConfigError::Invalid {
                key: "TOKEN_TTL",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => Duration::from_secs(3600),
        };
        if token_ttl.is_zero() || token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL",
                value: humantime::format_duration(token_ttl).to_string(),
                reason: "token lifetime must be positive and at most one year".into(),
            });
        }

        let allowed_extensions = match get("ALLOWED_EXTENSIONS") {
            Some(raw) => raw
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            token_ttl,
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_extensions,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            argon2_memory_kib: parse_or(&get, "ARGON2_MEMORY_KIB", 19 * 1024)?,
            argon2_iterations: parse_or(&get, "ARGON2_ITERATIONS", 2)?,
        })
    }

    /// Settings for tests and local experiments: in-memory store, short-lived
    /// tokens and the given upload directory.
    pub fn for_testing(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            token_ttl: Duration::from_secs(300),
            upload_dir: upload_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            host: "127.0.0.1".to_string(),
            port: 0,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
        }
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
