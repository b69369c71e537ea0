// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit record writer.
//!
//! Recording is a side effect of some primary operation (creating a user,
//! reordering mentors, ...). It must never make that operation fail, so the
//! public API returns `Option` and logs store errors instead of returning them.

use crate::db::ActivityStore;
use crate::middleware::request_meta::RequestMeta;
use crate::models::{ActivityAction, ActivityRecord, ActivityType, Actor, Changes};
use crate::services::description::describe;
use crate::services::diff::diff_changes;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Everything needed to write one audit record.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub action: ActivityAction,
    pub entity_type: ActivityType,
    pub entity_id: String,
    pub entity_name: String,
    /// Pre-built sentence. Generated from the other fields when empty.
    pub description: String,
    pub changes: Changes,
    pub metadata: Value,
}

impl NewActivity {
    /// Activity about an entity of `category`, with the description built
    /// from the standard templates.
    pub fn new(
        category: ActivityType,
        action: ActivityAction,
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Self {
        let entity_name = entity_name.into();
        Self {
            activity_type: category,
            action,
            entity_type: category,
            entity_id: entity_id.into(),
            description: describe(category, action, &entity_name, None),
            entity_name,
            changes: Changes::new(),
            metadata: Value::Object(Map::new()),
        }
    }

    /// An `updated` activity whose changes are the diff of `incoming` against `original`.
    pub fn update(
        category: ActivityType,
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
        original: &Map<String, Value>,
        incoming: &Map<String, Value>,
    ) -> Self {
        let mut activity = Self::new(category, ActivityAction::Updated, entity_id, entity_name);
        activity.changes = diff_changes(original, incoming);
        activity.description = describe(
            category,
            ActivityAction::Updated,
            &activity.entity_name,
            Some(&activity.changes),
        );
        activity
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Appends audit records to the store.
#[derive(Clone)]
pub struct ActivityRecorder {
    db: Arc<dyn ActivityStore>,
}

impl ActivityRecorder {
    pub fn new(db: Arc<dyn ActivityStore>) -> Self {
        Self { db }
    }

    /// Write one audit record.
    ///
    /// Returns the stored record, or `None` if the write failed. Failures
    /// are logged and never retried.
    pub async fn record(
        &self,
        activity: NewActivity,
        actor: &Actor,
        request: Option<&RequestMeta>,
    ) -> Option<ActivityRecord> {
        let description = if activity.description.trim().is_empty() {
            describe(
                activity.activity_type,
                activity.action,
                &activity.entity_name,
                Some(&activity.changes),
            )
        } else {
            activity.description
        };

        let record = ActivityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            activity_type: activity.activity_type,
            action: activity.action,
            entity_type: activity.entity_type,
            entity_id: activity.entity_id,
            entity_name: activity.entity_name,
            description,
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            user_email: actor.email.clone(),
            changes: activity.changes,
            metadata: activity.metadata,
            ip_address: request.and_then(RequestMeta::ip_address),
            user_agent: request.and_then(|r| r.user_agent.clone()),
            created_at: chrono::Utc::now(),
        };

        match self.db.insert_activity(&record).await {
            Ok(()) => {
                tracing::debug!(
                    activity_id = %record.id,
                    activity_type = %record.activity_type,
                    action = %record.action,
                    entity_id = %record.entity_id,
                    user_id = %record.user_id,
                    "Activity recorded"
                );
                Some(record)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    activity_type = %record.activity_type,
                    action = %record.action,
                    entity_id = %record.entity_id,
                    user_id = %record.user_id,
                    "Failed to record activity"
                );
                None
            }
        }
    }
}
