//! Database layer.
//!
//! Everything above this module talks to an [`ActivityStore`]; the
//! production implementation is Firestore, with an in-process store for
//! local development and tests.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use crate::error::AppError;
use crate::models::{ActivityAction, ActivityRecord, ActivityType, TypeActionCount, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Append-only audit log
    pub const ACTIVITIES: &str = "activities";
}

/// Conjunctive filter over activity records. `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub user_id: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub action: Option<ActivityAction>,
}

impl ActivityFilter {
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.user_id
            .as_deref()
            .map_or(true, |id| record.user_id == id)
            && self
                .activity_type
                .map_or(true, |t| record.activity_type == t)
            && self.action.map_or(true, |a| record.action == a)
    }
}

/// Document store operations used by the service.
///
/// Activity records are append-only: there is no update or
/// single-record delete for them.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    // ─── Activity Operations ─────────────────────────────────────

    /// Append one activity record.
    async fn insert_activity(&self, record: &ActivityRecord) -> Result<(), AppError>;

    /// Records matching `filter`, newest first, after skipping `skip`.
    async fn find_activities(
        &self,
        filter: &ActivityFilter,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError>;

    /// Number of records matching `filter`.
    async fn count_activities(&self, filter: &ActivityFilter) -> Result<u64, AppError>;

    /// Newest records about one entity.
    async fn find_activities_for_entity(
        &self,
        entity_type: ActivityType,
        entity_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError>;

    /// Number of records with `createdAt` strictly before `cutoff`.
    async fn count_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// Delete every record with `createdAt` strictly before `cutoff`.
    /// Returns the number of records deleted.
    async fn delete_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// Group-by `(type, action)` over the whole collection.
    async fn count_by_type_and_action(&self) -> Result<Vec<TypeActionCount>, AppError>;

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Create or replace a user.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    /// Returns `false` if the user did not exist.
    async fn delete_user(&self, id: &str) -> Result<bool, AppError>;
}
