// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log API routes.

use crate::db::ActivityFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityAction, ActivityRecord, ActivityType, TypeStats};
use crate::services::activity_log::DEFAULT_LIMIT;
use crate::services::{ActivityPage, ActivityQuery, CleanupResult, CleanupStats};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub const MAX_LIMIT: u32 = 100;
const DEFAULT_ENTITY_HISTORY_LIMIT: u32 = 10;

/// Activity routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(list_activities))
        .route("/api/activities/stats", get(activity_stats))
        .route(
            "/api/activities/cleanup",
            get(cleanup_stats).post(run_cleanup),
        )
        .route(
            "/api/activities/entity/{entity_type}/{entity_id}",
            get(entity_activities),
        )
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ListActivitiesParams {
    #[validate(range(min = 1, max = 100))]
    limit: Option<u32>,
    skip: Option<u32>,
    user_id: Option<String>,
    #[serde(rename = "type")]
    activity_type: Option<String>,
    action: Option<String>,
}

fn parse_type(raw: &str) -> Result<ActivityType> {
    raw.parse()
        .map_err(|e: String| AppError::BadRequest(format!("Invalid 'type' parameter: {}", e)))
}

fn parse_action(raw: &str) -> Result<ActivityAction> {
    raw.parse()
        .map_err(|e: String| AppError::BadRequest(format!("Invalid 'action' parameter: {}", e)))
}

impl ListActivitiesParams {
    fn into_query(self) -> Result<ActivityQuery> {
        self.validate()?;

        // Empty strings come from cleared dashboard filters
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(ActivityQuery {
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            skip: self.skip.unwrap_or(0),
            filter: ActivityFilter {
                user_id: non_empty(self.user_id),
                activity_type: non_empty(self.activity_type)
                    .as_deref()
                    .map(parse_type)
                    .transpose()?,
                action: non_empty(self.action)
                    .as_deref()
                    .map(parse_action)
                    .transpose()?,
            },
        })
    }
}

/// List activities, newest first.
async fn list_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListActivitiesParams>,
) -> Result<Json<ActivityPage>> {
    let query = params.into_query()?;

    tracing::debug!(
        user_id = %user.0.id,
        limit = query.limit,
        skip = query.skip,
        filter = ?query.filter,
        "Fetching activities"
    );

    Ok(Json(state.activity_log.list(&query).await))
}

// ─── Entity History ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct EntityHistoryParams {
    #[validate(range(min = 1, max = 100))]
    limit: Option<u32>,
}

/// Recent activity for one entity (dashboard detail panels).
async fn entity_activities(
    State(state): State<Arc<AppState>>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Query(params): Query<EntityHistoryParams>,
) -> Result<Json<Vec<ActivityRecord>>> {
    params.validate()?;
    let entity_type = parse_type(&entity_type)?;
    let limit = params.limit.unwrap_or(DEFAULT_ENTITY_HISTORY_LIMIT);

    Ok(Json(
        state
            .activity_log
            .recent_for_entity(entity_type, &entity_id, limit)
            .await,
    ))
}

// ─── Stats ───────────────────────────────────────────────────

/// Per-type / per-action counts.
async fn activity_stats(State(state): State<Arc<AppState>>) -> Json<Vec<TypeStats>> {
    Json(state.activity_log.stats().await)
}

// ─── Retention (admin) ───────────────────────────────────────

/// Dry-run: how many records a cleanup would delete.
async fn cleanup_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CleanupStats>> {
    Ok(Json(state.sweeper.cleanup_stats(&user.0).await?))
}

/// Delete expired records now.
async fn run_cleanup(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CleanupResult>> {
    Ok(Json(state.sweeper.run_cleanup(&user.0).await?))
}
