// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use agency_admin::config::Config;
use agency_admin::db::{FirestoreDb, MemoryDb};
use agency_admin::middleware::auth::create_jwt;
use agency_admin::models::{ActivityAction, ActivityRecord, ActivityType, Actor};
use agency_admin::routes::create_router;
use agency_admin::AppState;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Utc};
use std::sync::Arc;

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

/// Create a test app backed by the in-memory store.
/// Returns the router, the shared state and the store (for failure injection).
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryDb>) {
    let db = Arc::new(MemoryDb::new());
    let state = Arc::new(AppState::new(Config::test_default(), db.clone()));
    (create_router(state.clone()), state, db)
}

#[allow(dead_code)]
pub fn admin() -> Actor {
    Actor {
        id: "admin-1".to_string(),
        name: "Ada Admin".to_string(),
        email: "ada@agency.example".to_string(),
        is_admin: true,
    }
}

#[allow(dead_code)]
pub fn staff() -> Actor {
    Actor {
        id: "staff-1".to_string(),
        name: "Sam Staff".to_string(),
        email: "sam@agency.example".to_string(),
        is_admin: false,
    }
}

#[allow(dead_code)]
pub fn bearer(actor: &Actor, state: &AppState) -> String {
    let token = create_jwt(actor, &state.config.jwt_signing_key).expect("Failed to create JWT");
    format!("Bearer {}", token)
}

/// Authenticated request without a body.
#[allow(dead_code)]
pub fn authed(method: &str, uri: &str, actor: &Actor, state: &AppState) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(actor, state))
        .body(Body::empty())
        .unwrap()
}

/// Authenticated request with a JSON body.
#[allow(dead_code)]
pub fn authed_json(
    method: &str,
    uri: &str,
    actor: &Actor,
    state: &AppState,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(actor, state))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "agency-tests/1.0")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Build a stored record directly (bypassing the recorder) with a chosen timestamp.
#[allow(dead_code)]
pub fn record_at(
    activity_type: ActivityType,
    action: ActivityAction,
    user_id: &str,
    created_at: DateTime<Utc>,
) -> ActivityRecord {
    ActivityRecord {
        id: uuid::Uuid::new_v4().to_string(),
        activity_type,
        action,
        entity_type: activity_type,
        entity_id: format!("{}-entity", activity_type),
        entity_name: "Test Entity".to_string(),
        description: format!("{} Test Entity", action),
        user_id: user_id.to_string(),
        user_name: "Tester".to_string(),
        user_email: "tester@agency.example".to_string(),
        changes: Default::default(),
        metadata: serde_json::json!({}),
        ip_address: None,
        user_agent: None,
        created_at,
    }
}
