// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Production Identity Toolkit endpoint.
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP / Firebase project ID (also the expected ID-token audience)
    pub gcp_project_id: String,
    /// Firebase Web API key, used for Identity Toolkit calls
    pub firebase_api_key: String,
    /// Base URL of the Identity Toolkit API (emulator-aware)
    pub identity_toolkit_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Idle time after which a user's cached session is dropped
    pub session_idle_timeout: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            identity_toolkit_url: "http://127.0.0.1:9099/identitytoolkit.googleapis.com"
                .to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Load configuration from environment variables (and a `.env` file if present).
    ///
    /// When `FIREBASE_AUTH_EMULATOR_HOST` is set, account calls go to the
    /// local Auth emulator instead of Google.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let identity_toolkit_url = match env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => format!("http://{}/identitytoolkit.googleapis.com", host.trim()),
            Err(_) => IDENTITY_TOOLKIT_URL.to_string(),
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            identity_toolkit_url,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            session_idle_timeout: Duration::from_secs(
                env::var("SESSION_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("SESSION_IDLE_TIMEOUT_SECS"))?,
            ),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
