// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use crate::services::codec::DEFAULT_IMAGE_SIZE;
use std::env;
use std::path::PathBuf;

/// Smallest QR image edge we render, in pixels.
pub const MIN_QR_IMAGE_SIZE: u32 = 64;
/// Largest QR image edge we render, in pixels.
pub const MAX_QR_IMAGE_SIZE: u32 = 2048;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Edge length of issued token images (pixels)
    pub qr_image_size: u32,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            qr_image_size: DEFAULT_IMAGE_SIZE,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/uniclubs.db")),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            qr_image_size: parse_image_size(env::var("QR_IMAGE_SIZE").ok().as_deref())?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Parse `QR_IMAGE_SIZE`, clamped to the supported range.
fn parse_image_size(raw: Option<&str>) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_IMAGE_SIZE);
    };
    let size: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid("QR_IMAGE_SIZE", raw.to_string()))?;
    Ok(size.clamp(MIN_QR_IMAGE_SIZE, MAX_QR_IMAGE_SIZE))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("DATABASE_PATH", "/tmp/uniclubs-test.db");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.database_path, PathBuf::from("/tmp/uniclubs-test.db"));
    }

    #[test]
    fn test_image_size_parsing() {
        assert_eq!(parse_image_size(None).unwrap(), DEFAULT_IMAGE_SIZE);
        assert_eq!(parse_image_size(Some("512")).unwrap(), 512);
        assert_eq!(parse_image_size(Some("1")).unwrap(), MIN_QR_IMAGE_SIZE);
        assert_eq!(parse_image_size(Some("100000")).unwrap(), MAX_QR_IMAGE_SIZE);
        assert!(matches!(
            parse_image_size(Some("big")),
            Err(ConfigError::Invalid("QR_IMAGE_SIZE", _))
        ));
    }
}
