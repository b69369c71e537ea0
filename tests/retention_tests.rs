// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity retention tests.
//!
//! These tests verify that:
//! 1. The cutoff boundary is strict
//! 2. Sweeps are idempotent
//! 3. Admin cleanup endpoints reject non-admins and surface store errors

use agency_admin::db::{ActivityStore, MemoryDb};
use agency_admin::models::{ActivityAction, ActivityType};
use agency_admin::services::retention::retention_cutoff;
use agency_admin::services::RetentionSweeper;
use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{admin, authed, body_json, create_test_app, record_at, staff};

#[tokio::test]
async fn test_boundary_is_strict() {
    let db = Arc::new(MemoryDb::new());
    let sweeper = RetentionSweeper::new(db.clone());

    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
    let cutoff = retention_cutoff(now);

    let expired = record_at(
        ActivityType::User,
        ActivityAction::Login,
        "a",
        cutoff - Duration::seconds(1),
    );
    let at_cutoff = record_at(ActivityType::User, ActivityAction::Login, "a", cutoff);
    let inside = record_at(
        ActivityType::User,
        ActivityAction::Login,
        "a",
        cutoff + Duration::seconds(1),
    );
    for r in [&expired, &at_cutoff, &inside] {
        db.insert_activity(r).await.unwrap();
    }

    let result = sweeper.sweep_at(now).await.unwrap();
    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.cutoff_date, cutoff);

    let remaining = db
        .find_activities(&Default::default(), 0, 10)
        .await
        .unwrap();
    let ids: Vec<&str> = remaining.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.contains(&at_cutoff.id.as_str()));
    assert!(ids.contains(&inside.id.as_str()));
    assert!(!ids.contains(&expired.id.as_str()));
}

#[tokio::test]
async fn test_second_sweep_deletes_nothing() {
    let db = Arc::new(MemoryDb::new());
    let sweeper = RetentionSweeper::new(db.clone());
    let now = Utc::now();

    for days in [70, 90, 120, 1] {
        db.insert_activity(&record_at(
            ActivityType::Media,
            ActivityAction::Uploaded,
            "a",
            now - Duration::days(days),
        ))
        .await
        .unwrap();
    }

    assert_eq!(sweeper.sweep_at(now).await.unwrap().deleted_count, 3);
    assert_eq!(sweeper.sweep_at(now).await.unwrap().deleted_count, 0);
    assert_eq!(db.activity_count(), 1);
}

#[tokio::test]
async fn test_quiet_sweep_survives_outage() {
    let db = Arc::new(MemoryDb::new());
    db.set_activities_unavailable(true);
    let sweeper = RetentionSweeper::new(db.clone());

    // Must return normally
    sweeper.sweep_quietly().await;
}

#[tokio::test]
async fn test_cleanup_stats_endpoint() {
    let (app, state, db) = create_test_app();
    let now = Utc::now();

    for days in [100, 1, 2] {
        db.insert_activity(&record_at(
            ActivityType::Event,
            ActivityAction::Updated,
            "a",
            now - Duration::days(days),
        ))
        .await
        .unwrap();
    }

    let response = app
        .oneshot(authed("GET", "/api/activities/cleanup", &admin(), &state))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["totalActivities"], 3);
    assert_eq!(body["oldActivities"], 1);
    assert_eq!(body["recentActivities"], 2);
    assert_eq!(body["cleanupRecommended"], true);
    assert!(body["cutoffDate"].as_str().unwrap().ends_with('Z'));

    // Dry run deletes nothing
    assert_eq!(db.activity_count(), 3);
}

#[tokio::test]
async fn test_run_cleanup_endpoint() {
    let (app, state, db) = create_test_app();
    let now = Utc::now();

    for days in [100, 200, 1] {
        db.insert_activity(&record_at(
            ActivityType::Country,
            ActivityAction::Created,
            "a",
            now - Duration::days(days),
        ))
        .await
        .unwrap();
    }

    let response = app
        .clone()
        .oneshot(authed("POST", "/api/activities/cleanup", &admin(), &state))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deletedCount"], 2);

    let response = app
        .oneshot(authed("GET", "/api/activities/cleanup", &admin(), &state))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["oldActivities"], 0);
    assert_eq!(body["cleanupRecommended"], false);
}

#[tokio::test]
async fn test_cleanup_rejects_non_admin() {
    let (app, state, db) = create_test_app();
    db.insert_activity(&record_at(
        ActivityType::User,
        ActivityAction::Created,
        "a",
        Utc::now() - Duration::days(365),
    ))
    .await
    .unwrap();

    for method in ["GET", "POST"] {
        let response = app
            .clone()
            .oneshot(authed(method, "/api/activities/cleanup", &staff(), &state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "forbidden");
    }

    assert_eq!(db.activity_count(), 1);
}

#[tokio::test]
async fn test_cleanup_failure_is_reported() {
    let (app, state, db) = create_test_app();
    db.set_activities_unavailable(true);

    let response = app
        .oneshot(authed("POST", "/api/activities/cleanup", &admin(), &state))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "database_error");
}
