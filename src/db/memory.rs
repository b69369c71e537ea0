// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store for local development and tests.
//!
//! Records are kept in insertion order so that ties on `createdAt` resolve
//! the same way they do in an ordered-insert collection.

use crate::db::{ActivityFilter, ActivityStore};
use crate::error::AppError;
use crate::models::{ActivityRecord, ActivityType, TypeActionCount, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store.
#[derive(Default)]
pub struct MemoryDb {
    activities: RwLock<Vec<ActivityRecord>>,
    users: RwLock<HashMap<String, User>>,
    /// When set, every activity operation fails as if the store were down.
    activities_unavailable: AtomicBool,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage of the activities collection. User operations keep working.
    pub fn set_activities_unavailable(&self, unavailable: bool) {
        self.activities_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored activity records, bypassing failure injection.
    pub fn activity_count(&self) -> usize {
        self.activities.read().len()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.activities_unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "activities collection unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Newest first. `sort_by` is stable, so equal timestamps keep insertion order.
fn newest_first(mut records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

#[async_trait]
impl ActivityStore for MemoryDb {
    async fn insert_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        self.check_available()?;
        self.activities.write().push(record.clone());
        Ok(())
    }

    async fn find_activities(
        &self,
        filter: &ActivityFilter,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        self.check_available()?;
        let matching: Vec<ActivityRecord> = self
            .activities
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        Ok(newest_first(matching)
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_activities(&self, filter: &ActivityFilter) -> Result<u64, AppError> {
        self.check_available()?;
        Ok(self
            .activities
            .read()
            .iter()
            .filter(|r| filter.matches(r))
            .count() as u64)
    }

    async fn find_activities_for_entity(
        &self,
        entity_type: ActivityType,
        entity_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        self.check_available()?;
        let matching: Vec<ActivityRecord> = self
            .activities
            .read()
            .iter()
            .filter(|r| r.entity_type == entity_type && r.entity_id == entity_id)
            .cloned()
            .collect();

        Ok(newest_first(matching)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn count_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        self.check_available()?;
        Ok(self
            .activities
            .read()
            .iter()
            .filter(|r| r.created_at < cutoff)
            .count() as u64)
    }

    async fn delete_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        self.check_available()?;
        let mut activities = self.activities.write();
        let before = activities.len();
        activities.retain(|r| r.created_at >= cutoff);
        Ok((before - activities.len()) as u64)
    }

    async fn count_by_type_and_action(&self) -> Result<Vec<TypeActionCount>, AppError> {
        self.check_available()?;
        let mut counts: HashMap<_, u64> = HashMap::new();
        for record in self.activities.read().iter() {
            *counts
                .entry((record.activity_type, record.action))
                .or_insert(0) += 1;
        }

        Ok(counts
            .into_iter()
            .map(|((activity_type, action), count)| TypeActionCount {
                activity_type,
                action,
                count,
            })
            .collect())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.write().insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.users.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityAction;
    use chrono::Duration;

    fn record(id: &str, created_at: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            activity_type: ActivityType::User,
            action: ActivityAction::Created,
            entity_type: ActivityType::User,
            entity_id: "u1".to_string(),
            entity_name: "Bob".to_string(),
            description: "User \"Bob\" was created".to_string(),
            user_id: "admin".to_string(),
            user_name: "Admin".to_string(),
            user_email: "admin@example.com".to_string(),
            changes: Default::default(),
            metadata: serde_json::json!({}),
            ip_address: None,
            user_agent: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let db = MemoryDb::new();
        let t = Utc::now();
        db.insert_activity(&record("a", t)).await.unwrap();
        db.insert_activity(&record("b", t)).await.unwrap();
        db.insert_activity(&record("c", t + Duration::seconds(1)))
            .await
            .unwrap();

        let found = db
            .find_activities(&ActivityFilter::default(), 0, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_unavailable_fails_activity_ops_only() {
        let db = MemoryDb::new();
        db.set_activities_unavailable(true);

        assert!(db.insert_activity(&record("a", Utc::now())).await.is_err());
        assert!(db.list_users().await.is_ok());
        assert_eq!(db.activity_count(), 0);
    }
}
