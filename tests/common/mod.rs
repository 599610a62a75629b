// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use cyclology::config::Config;
use cyclology::db::{FirestoreDb, MemoryStore};
use cyclology::models::EntryData;
use cyclology::routes::create_router;
use cyclology::services::{FirebaseTokenVerifier, IdentityToolkit};
use cyclology::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_KID: &str = "cyclology-test-key";

const SIGNING_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_signing_key.pem");
const VERIFYING_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_signing_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Mint an RS256 token with arbitrary claims, signed by the fixture key.
#[allow(dead_code)]
pub fn mint_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM).expect("fixture signing key");
    encode(&header, claims, &key).expect("token encodes")
}

/// Claims of a valid Firebase ID token for `uid`.
#[allow(dead_code)]
pub fn id_token_claims(config: &Config, uid: &str) -> Value {
    let now = now_secs();
    json!({
        "iss": format!("https://securetoken.google.com/{}", config.gcp_project_id),
        "aud": config.gcp_project_id,
        "sub": uid,
        "user_id": uid,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
        "name": "Test Rider",
        "email": format!("{uid}@example.com"),
    })
}

/// A valid Firebase ID token for `uid`.
#[allow(dead_code)]
pub fn mint_id_token(config: &Config, uid: &str) -> String {
    mint_token(&id_token_claims(config, uid))
}

#[allow(dead_code)]
pub fn test_verifier(config: &Config) -> Arc<FirebaseTokenVerifier> {
    let key = DecodingKey::from_rsa_pem(VERIFYING_KEY_PEM).expect("fixture verifying key");
    Arc::new(FirebaseTokenVerifier::new_with_static_key(config, TEST_KID, key).unwrap())
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState<MemoryStore>>, Arc<MemoryStore>) {
    create_test_app_with_accounts(IdentityToolkit::new(&Config::test_default()))
}

/// Like [`create_test_app`], with account calls going to `accounts`.
#[allow(dead_code)]
pub fn create_test_app_with_accounts(
    accounts: IdentityToolkit,
) -> (axum::Router, Arc<AppState<MemoryStore>>, Arc<MemoryStore>) {
    let config = Config::test_default();
    let store = Arc::new(MemoryStore::new());
    let verifier = test_verifier(&config);

    let mut state = AppState::new(config, store.clone(), verifier);
    state.accounts = accounts;
    let state = Arc::new(state);

    (create_router(state.clone()), state, store)
}

/// Entry data for a col at the given position.
#[allow(dead_code)]
pub fn col(name: &str, lat: f64, lng: f64) -> EntryData {
    EntryData {
        name: name.to_string(),
        time: Some("01:05:30".to_string()),
        distance: Some(12.5),
        elevation: Some(900),
        date: None,
        lat,
        lng,
        created_at: None,
    }
}

/// Serve a local stand-in for the Identity Toolkit `accounts:delete` call.
///
/// Deletion succeeds unless `failure` names the error message to answer
/// with; a wrong API key is always rejected. Returns the base URL.
#[allow(dead_code)]
pub async fn fake_identity_toolkit(failure: Option<&'static str>) -> String {
    use axum::{extract::Query, http::StatusCode, routing::post, Json};
    use std::collections::HashMap;

    let delete = move |Query(params): Query<HashMap<String, String>>,
                       Json(body): Json<Value>| async move {
        let message = if params.get("key").map(String::as_str) != Some("test_api_key") {
            "API_KEY_INVALID"
        } else if body["idToken"].as_str().unwrap_or("").is_empty() {
            "MISSING_ID_TOKEN"
        } else if let Some(message) = failure {
            message
        } else {
            return (StatusCode::OK, Json(json!({ "kind": "deleted" })));
        };
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "code": 400, "message": message } })),
        )
    };

    let app = axum::Router::new().route("/v1/accounts:delete", post(delete));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
