// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity_log;
pub mod description;
pub mod diff;
pub mod recorder;
pub mod retention;

pub use activity_log::{ActivityLog, ActivityPage, ActivityQuery};
pub use recorder::{ActivityRecorder, NewActivity};
pub use retention::{CleanupResult, CleanupStats, RetentionSweeper};
