// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard user management routes.
//!
//! Every mutation here writes an audit record. Recording is best-effort:
//! a failed audit write is logged and the mutation still succeeds.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::RequestMeta;
use crate::models::user::normalize_email;
use crate::models::{ActivityAction, ActivityType, NewUser, User, UserUpdate};
use crate::routes::require_admin;
use crate::services::diff::snapshot_without_secrets;
use crate::services::NewActivity;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use validator::Validate;

/// User management routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
}

/// User as returned by the API (no secrets).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            is_active: user.is_active,
        }
    }
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    meta: RequestMeta,
    Json(mut payload): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    require_admin(&actor)?;
    payload.name = payload.name.trim().to_string();
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    let now = chrono::Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        is_admin: payload.is_admin,
        is_active: true,
        password_hash: None,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, created_by = %actor.0.id, "User created");

    state
        .recorder
        .record(
            NewActivity::new(ActivityType::User, ActivityAction::Created, &user.id, &user.name)
                .with_metadata(json!({ "email": user.email, "isAdmin": user.is_admin })),
            &actor.0,
            Some(&meta),
        )
        .await;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Pick the audit action for an update: a change to `isAdmin` alone is a role change.
fn update_action(changed: &[&str]) -> ActivityAction {
    if changed == ["isAdmin"] {
        ActivityAction::RoleChanged
    } else {
        ActivityAction::Updated
    }
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    meta: RequestMeta,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<UserResponse>> {
    require_admin(&actor)?;

    let mut update: UserUpdate = serde_json::from_value(Value::Object(body.clone()))
        .map_err(|e| AppError::BadRequest(format!("Invalid user update: {}", e)))?;
    update.normalize();
    update.validate()?;

    let mut user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    let original = snapshot_without_secrets(&user);
    update.apply_to(&mut user);
    user.updated_at = chrono::Utc::now();
    state.db.upsert_user(&user).await?;

    // Diff the normalized values of the fields the client sent, in the order sent
    let incoming: Map<String, Value> = match serde_json::to_value(&update) {
        Ok(Value::Object(mut known)) => body
            .keys()
            .filter_map(|field| known.remove(field).map(|value| (field.clone(), value)))
            .collect(),
        _ => Map::new(),
    };

    let mut activity =
        NewActivity::update(ActivityType::User, &user.id, &user.name, &original, &incoming);
    let changed: Vec<&str> = activity.changes.keys().map(String::as_str).collect();
    let action = update_action(&changed);
    if action != ActivityAction::Updated {
        activity.action = action;
        activity.description =
            crate::services::description::describe(ActivityType::User, action, &user.name, None);
    }

    state.recorder.record(activity, &actor.0, Some(&meta)).await;

    tracing::info!(user_id = %user.id, updated_by = %actor.0.id, "User updated");
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    meta: RequestMeta,
) -> Result<StatusCode> {
    require_admin(&actor)?;

    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    if user.id == actor.0.id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    state.db.delete_user(&id).await?;
    tracing::info!(user_id = %id, deleted_by = %actor.0.id, "User deleted");

    state
        .recorder
        .record(
            NewActivity::new(ActivityType::User, ActivityAction::Deleted, &user.id, &user.name),
            &actor.0,
            Some(&meta),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
