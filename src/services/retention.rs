// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log retention.
//!
//! Records older than two calendar months are deleted. Three entry points:
//! - a background task sweeping on a fixed interval,
//! - an opportunistic sweep that swallows errors (used before list queries
//!   when enabled in config),
//! - admin-only stats/cleanup operations that report errors.

use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::Actor;
use crate::time_utils::serialize_rfc3339;
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Retention window in calendar months.
pub const RETENTION_MONTHS: u32 = 2;

/// Oldest `createdAt` that is kept. Records strictly before it are expired.
///
/// Uses calendar-month subtraction; when the current day does not exist in
/// the target month it is clamped to that month's last day.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(RETENTION_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Dry-run report for admins.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CleanupStats {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_activities: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub old_activities: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub recent_activities: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    #[serde(serialize_with = "serialize_rfc3339")]
    pub cutoff_date: DateTime<Utc>,
    pub cleanup_recommended: bool,
}

/// Result of an executed cleanup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CleanupResult {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub deleted_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    #[serde(serialize_with = "serialize_rfc3339")]
    pub cutoff_date: DateTime<Utc>,
}

/// Deletes expired activity records.
#[derive(Clone)]
pub struct RetentionSweeper {
    db: Arc<dyn ActivityStore>,
}

impl RetentionSweeper {
    pub fn new(db: Arc<dyn ActivityStore>) -> Self {
        Self { db }
    }

    /// Delete everything older than the cutoff computed from `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<CleanupResult> {
        let cutoff = retention_cutoff(now);
        let deleted_count = self.db.delete_activities_before(cutoff).await?;

        if deleted_count > 0 {
            tracing::info!(deleted_count, cutoff = %cutoff, "Expired activities deleted");
        }

        Ok(CleanupResult {
            deleted_count,
            cutoff_date: cutoff,
        })
    }

    /// Opportunistic sweep. Errors are logged and dropped.
    pub async fn sweep_quietly(&self) {
        if let Err(e) = self.sweep_at(Utc::now()).await {
            tracing::warn!(error = %e, "Opportunistic activity cleanup failed");
        }
    }

    /// Run [`sweep_quietly`](Self::sweep_quietly) every `interval` in a background task.
    pub fn spawn_periodic(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep_quietly().await;
            }
        })
    }

    /// Counts of expired and retained records, without deleting anything.
    pub async fn cleanup_stats(&self, actor: &Actor) -> Result<CleanupStats> {
        require_admin(actor)?;
        self.cleanup_stats_at(Utc::now()).await
    }

    pub async fn cleanup_stats_at(&self, now: DateTime<Utc>) -> Result<CleanupStats> {
        let cutoff = retention_cutoff(now);
        let total_activities = self
            .db
            .count_activities(&crate::db::ActivityFilter::default())
            .await?;
        let old_activities = self.db.count_activities_before(cutoff).await?;

        Ok(CleanupStats {
            total_activities,
            old_activities,
            recent_activities: total_activities.saturating_sub(old_activities),
            cutoff_date: cutoff,
            cleanup_recommended: old_activities > 0,
        })
    }

    /// Admin-triggered cleanup. Store errors are returned to the caller.
    pub async fn run_cleanup(&self, actor: &Actor) -> Result<CleanupResult> {
        require_admin(actor)?;

        tracing::info!(user_id = %actor.id, "Admin-triggered activity cleanup");
        self.sweep_at(Utc::now()).await
    }
}

fn require_admin(actor: &Actor) -> Result<()> {
    if !actor.is_admin {
        tracing::warn!(user_id = %actor.id, "Non-admin attempted activity cleanup");
        return Err(AppError::Forbidden);
    }
    Ok(())
}
