// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use std::sync::Arc;
use uniclubs_checkin::config::Config;
use uniclubs_checkin::db::Database;
use uniclubs_checkin::middleware::auth::{create_jwt, Role};
use uniclubs_checkin::models::UserId;
use uniclubs_checkin::routes::create_router;
use uniclubs_checkin::AppState;

/// Create a test app over a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Database::open_in_memory()
        .await
        .expect("Failed to open in-memory database");

    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test JWT for the given user and role.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, role: Role, signing_key: &[u8]) -> String {
    create_jwt(UserId(user_id), role, signing_key).expect("Failed to sign test JWT")
}

/// Collect a response body as raw bytes.
#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
