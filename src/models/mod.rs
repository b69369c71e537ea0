// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod stats;
pub mod user;

pub use activity::{ActivityAction, ActivityRecord, ActivityType, Actor, Changes, FieldChange};
pub use stats::{ActionCount, TypeActionCount, TypeStats};
pub use user::{NewUser, User, UserUpdate};
