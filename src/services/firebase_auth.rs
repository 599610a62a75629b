// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication: ID token verification and account deletion.

use crate::config::Config;
use crate::error::AppError;
use crate::services::erasure::AccountDeleter;
use crate::services::session::SessionUser;
use anyhow::Context;
use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

/// Public keys for tokens signed by `securetoken@system.gserviceaccount.com`.
const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

#[derive(Clone)]
enum VerifierMode {
    Google,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase Authentication ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    issuer: String,
    audience: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    /// Create a production verifier that fetches and caches the securetoken JWKS.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let verifier = Self::with_mode(config, VerifierMode::Google)?;
        tracing::info!(
            issuer = %verifier.issuer,
            audience = %verifier.audience,
            "Initialized Firebase ID token verifier"
        );
        Ok(verifier)
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key kid must not be empty");
        }

        Self::with_mode(
            config,
            VerifierMode::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn with_mode(config: &Config, mode: VerifierMode) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            issuer: format!("https://securetoken.google.com/{}", config.gcp_project_id),
            audience: config.gcp_project_id.clone(),
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a Firebase ID token and return the user it identifies.
    pub async fn verify_id_token(&self, token: &str) -> Result<SessionUser, AppError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Invalid JWT header");
            AppError::InvalidToken
        })?;

        if header.alg != Algorithm::RS256 {
            tracing::debug!(alg = ?header.alg, "Unexpected JWT alg");
            return Err(AppError::InvalidToken);
        }

        let kid = header.kid.ok_or(AppError::InvalidToken)?;
        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "ID token validation failed");
                AppError::InvalidToken
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AppError::InvalidToken);
        }
        not_in_future(claims.iat)?;
        if let Some(auth_time) = claims.auth_time {
            not_in_future(auth_time)?;
        }

        Ok(SessionUser {
            uid: claims.sub,
            display_name: claims.name,
            email: claims.email,
            photo_url: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, AppError> {
        if let VerifierMode::StaticKey {
            kid: static_kid,
            decoding_key,
        } = &self.mode
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }
            tracing::debug!(kid, "Unknown JWT kid for static verifier");
            return Err(AppError::InvalidToken);
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        tracing::debug!(kid, "JWT kid not found in JWKS after refresh");
        Err(AppError::InvalidToken)
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), AppError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!("Refreshing securetoken JWKS cache");

        let response = self
            .http_client
            .get(SECURETOKEN_JWKS_URL)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid: HashMap<String, Arc<DecodingKey>> = jwks
            .keys
            .into_iter()
            .filter(|jwk| jwk.kty == "RSA" && !jwk.kid.trim().is_empty())
            .filter(|jwk| jwk.alg.as_deref().unwrap_or("RS256") == "RS256")
            .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => Some((jwk.kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                    None
                }
            })
            .collect();

        if keys_by_kid.is_empty() {
            return Err(AppError::Auth(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Securetoken JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    iat: u64,
    auth_time: Option<u64>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Token from an `Authorization: Bearer` header.
pub fn extract_bearer_token(auth_header: Option<&HeaderValue>) -> Option<&str> {
    auth_header?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn not_in_future(timestamp: u64) -> Result<(), AppError> {
    if timestamp > now_unix_secs() + CLOCK_SKEW_SECS {
        tracing::debug!(timestamp, "ID token timestamp is in the future");
        return Err(AppError::InvalidToken);
    }
    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct IdentityToolkit {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkit {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(&config.identity_toolkit_url, &config.firebase_api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Delete the account the ID token belongs to.
    pub async fn delete_account(&self, id_token: &str) -> Result<(), AppError> {
        let url = format!("{}/v1/accounts:delete", self.base_url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Account deletion request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_default();

        let err = map_error_code(&code)
            .unwrap_or_else(|| AppError::Auth(format!("HTTP {}: {}", status, body)));
        tracing::warn!(status = %status, code = %code, "Account deletion rejected");
        Err(err)
    }

    /// An [`AccountDeleter`] for the account behind `id_token`.
    pub fn current_account(&self, id_token: impl Into<String>) -> CurrentAccount {
        CurrentAccount {
            client: self.clone(),
            id_token: id_token.into(),
        }
    }
}

/// Error codes look like `CREDENTIAL_TOO_OLD_LOGIN_AGAIN` or `INVALID_ID_TOKEN : detail`.
fn map_error_code(message: &str) -> Option<AppError> {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Some(AppError::RequiresRecentLogin),
        "INVALID_ID_TOKEN" | "USER_NOT_FOUND" | "TOKEN_EXPIRED" => Some(AppError::InvalidToken),
        _ => None,
    }
}

/// The signed-in user's account, identified by their ID token.
pub struct CurrentAccount {
    client: IdentityToolkit,
    id_token: String,
}

impl AccountDeleter for CurrentAccount {
    async fn delete_current_account(&self) -> Result<(), AppError> {
        self.client.delete_account(&self.id_token).await
    }
}
