// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Agency admin: activity audit log for the agency dashboard
//!
//! Every mutating admin operation records who changed what, and from where.
//! This crate provides the backend API that writes, lists, aggregates and
//! expires those records.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ActivityStore;
use services::{ActivityLog, ActivityRecorder, RetentionSweeper};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn ActivityStore>,
    pub recorder: ActivityRecorder,
    pub activity_log: ActivityLog,
    pub sweeper: RetentionSweeper,
}

impl AppState {
    /// Wire the services around a store.
    pub fn new(config: Config, db: Arc<dyn ActivityStore>) -> Self {
        let sweeper = RetentionSweeper::new(db.clone());
        let activity_log =
            ActivityLog::new(db.clone(), sweeper.clone(), config.retention_sweep_on_read);

        Self {
            recorder: ActivityRecorder::new(db.clone()),
            activity_log,
            sweeper,
            config,
            db,
        }
    }
}
