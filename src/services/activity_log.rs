// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log read paths: paginated listing, per-entity history and stats.
//!
//! Store failures are logged and turned into empty results; the dashboard
//! treats them the same as "no activity".

use crate::db::{ActivityFilter, ActivityStore};
use crate::models::stats::aggregate_by_type;
use crate::models::{ActivityRecord, ActivityType, TypeStats};
use crate::services::retention::RetentionSweeper;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_LIMIT: u32 = 20;

/// One page of activity records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityPage {
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub activities: Vec<ActivityRecord>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    pub has_more: bool,
}

impl ActivityPage {
    pub fn empty() -> Self {
        Self {
            activities: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// Pagination and filters for [`ActivityLog::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    pub limit: u32,
    pub skip: u32,
    pub filter: ActivityFilter,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
            filter: ActivityFilter::default(),
        }
    }
}

/// Read access to the activity log.
#[derive(Clone)]
pub struct ActivityLog {
    db: Arc<dyn ActivityStore>,
    sweeper: RetentionSweeper,
    sweep_on_read: bool,
}

impl ActivityLog {
    pub fn new(db: Arc<dyn ActivityStore>, sweeper: RetentionSweeper, sweep_on_read: bool) -> Self {
        Self {
            db,
            sweeper,
            sweep_on_read,
        }
    }

    /// Newest-first page of records matching the query.
    pub async fn list(&self, query: &ActivityQuery) -> ActivityPage {
        if self.sweep_on_read {
            self.sweeper.sweep_quietly().await;
        }

        let activities = match self
            .db
            .find_activities(&query.filter, query.skip, query.limit)
            .await
        {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, filter = ?query.filter, "Failed to fetch activities");
                return ActivityPage::empty();
            }
        };

        let total = match self.db.count_activities(&query.filter).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, filter = ?query.filter, "Failed to count activities");
                return ActivityPage::empty();
            }
        };

        ActivityPage {
            activities,
            total,
            has_more: u64::from(query.skip) + u64::from(query.limit) < total,
        }
    }

    /// Most recent records about one entity.
    pub async fn recent_for_entity(
        &self,
        entity_type: ActivityType,
        entity_id: &str,
        limit: u32,
    ) -> Vec<ActivityRecord> {
        self.db
            .find_activities_for_entity(entity_type, entity_id, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    error = %e,
                    entity_type = %entity_type,
                    entity_id,
                    "Failed to fetch entity activity"
                );
                Vec::new()
            })
    }

    /// Per-type and per-action counts over every retained record.
    pub async fn stats(&self) -> Vec<TypeStats> {
        match self.db.count_by_type_and_action().await {
            Ok(rows) => aggregate_by_type(&rows),
            Err(e) => {
                tracing::error!(error = %e, "Failed to aggregate activity stats");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{ActivityAction, Actor};
    use crate::services::recorder::{ActivityRecorder, NewActivity};

    fn actor(id: &str) -> Actor {
        Actor {
            id: id.to_string(),
            name: format!("Actor {}", id),
            email: format!("{}@example.com", id),
            is_admin: true,
        }
    }

    async fn setup(n: usize) -> (Arc<MemoryDb>, ActivityLog) {
        let db = Arc::new(MemoryDb::new());
        let recorder = ActivityRecorder::new(db.clone());
        for i in 0..n {
            recorder
                .record(
                    NewActivity::new(
                        ActivityType::Mentor,
                        ActivityAction::Created,
                        format!("m{}", i),
                        format!("Mentor {}", i),
                    ),
                    &actor("a1"),
                    None,
                )
                .await
                .unwrap();
        }
        let log = ActivityLog::new(db.clone(), RetentionSweeper::new(db.clone()), false);
        (db, log)
    }

    #[tokio::test]
    async fn test_pagination_math() {
        let (_db, log) = setup(45).await;

        let last = log
            .list(&ActivityQuery {
                limit: 20,
                skip: 40,
                ..Default::default()
            })
            .await;
        assert_eq!(last.total, 45);
        assert_eq!(last.activities.len(), 5);
        assert!(!last.has_more);

        let middle = log
            .list(&ActivityQuery {
                limit: 20,
                skip: 20,
                ..Default::default()
            })
            .await;
        assert_eq!(middle.activities.len(), 20);
        assert!(middle.has_more);
    }

    #[tokio::test]
    async fn test_defaults() {
        let (_db, log) = setup(25).await;
        let page = log.list(&ActivityQuery::default()).await;
        assert_eq!(page.activities.len(), 20);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_read_failure_yields_empty_page() {
        let (db, log) = setup(3).await;
        db.set_activities_unavailable(true);

        let page = log.list(&ActivityQuery::default()).await;
        assert!(page.activities.is_empty());
        assert_eq!(page.total, 0);
        assert!(!page.has_more);

        assert!(log.stats().await.is_empty());
        assert!(log
            .recent_for_entity(ActivityType::Mentor, "m1", 5)
            .await
            .is_empty());
    }

    fn expired_record(now: chrono::DateTime<chrono::Utc>) -> ActivityRecord {
        ActivityRecord {
            id: "expired".to_string(),
            activity_type: ActivityType::Event,
            action: ActivityAction::Deleted,
            entity_type: ActivityType::Event,
            entity_id: "e1".to_string(),
            entity_name: "Gala".to_string(),
            description: "Event \"Gala\" was deleted".to_string(),
            user_id: "a1".to_string(),
            user_name: "Actor a1".to_string(),
            user_email: "a1@example.com".to_string(),
            changes: Default::default(),
            metadata: serde_json::json!({}),
            ip_address: None,
            user_agent: None,
            created_at: now - chrono::Duration::days(90),
        }
    }

    #[tokio::test]
    async fn test_sweep_on_read_drops_expired_before_listing() {
        let (db, _) = setup(1).await;
        db.insert_activity(&expired_record(chrono::Utc::now()))
            .await
            .unwrap();
        let log = ActivityLog::new(db.clone(), RetentionSweeper::new(db.clone()), true);

        let page = log.list(&ActivityQuery::default()).await;

        assert_eq!(page.total, 1);
        assert_eq!(page.activities.len(), 1);
        assert_ne!(page.activities[0].id, "expired");
        assert_eq!(db.activity_count(), 1);
    }

    #[tokio::test]
    async fn test_sweep_on_read_disabled_keeps_expired() {
        let (db, log) = setup(1).await;
        db.insert_activity(&expired_record(chrono::Utc::now()))
            .await
            .unwrap();

        let page = log.list(&ActivityQuery::default()).await;

        assert_eq!(page.total, 2);
        assert_eq!(db.activity_count(), 2);
    }

    #[tokio::test]
    async fn test_sweep_failure_does_not_fail_listing() {
        let (db, _) = setup(2).await;
        db.set_activities_unavailable(true);
        let log = ActivityLog::new(db.clone(), RetentionSweeper::new(db.clone()), true);

        // Sweep error is swallowed; the read then degrades to an empty page
        let page = log.list(&ActivityQuery::default()).await;
        assert!(page.activities.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_recent_for_entity() {
        let (_db, log) = setup(4).await;
        let records = log.recent_for_entity(ActivityType::Mentor, "m2", 10).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_name, "Mentor 2");
    }
}
