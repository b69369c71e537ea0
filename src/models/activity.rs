// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity audit record model for storage and API.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Domain category of an audited entity.
///
/// Also used for `entityType`, which mirrors `type` at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityType {
    User,
    Event,
    Mentor,
    Country,
    Media,
    System,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::User,
        ActivityType::Event,
        ActivityType::Mentor,
        ActivityType::Country,
        ActivityType::Media,
        ActivityType::System,
    ];

    /// Stored spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::User => "user",
            ActivityType::Event => "event",
            ActivityType::Mentor => "mentor",
            ActivityType::Country => "country",
            ActivityType::Media => "media",
            ActivityType::System => "system",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown activity type '{}'", s))
    }
}

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Reordered,
    Activated,
    Deactivated,
    Joined,
    Left,
    Uploaded,
    Downloaded,
    Viewed,
    Searched,
    Login,
    Logout,
    PasswordChanged,
    RoleChanged,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 16] = [
        ActivityAction::Created,
        ActivityAction::Updated,
        ActivityAction::Deleted,
        ActivityAction::Reordered,
        ActivityAction::Activated,
        ActivityAction::Deactivated,
        ActivityAction::Joined,
        ActivityAction::Left,
        ActivityAction::Uploaded,
        ActivityAction::Downloaded,
        ActivityAction::Viewed,
        ActivityAction::Searched,
        ActivityAction::Login,
        ActivityAction::Logout,
        ActivityAction::PasswordChanged,
        ActivityAction::RoleChanged,
    ];

    /// Stored spelling of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::Deleted => "deleted",
            ActivityAction::Reordered => "reordered",
            ActivityAction::Activated => "activated",
            ActivityAction::Deactivated => "deactivated",
            ActivityAction::Joined => "joined",
            ActivityAction::Left => "left",
            ActivityAction::Uploaded => "uploaded",
            ActivityAction::Downloaded => "downloaded",
            ActivityAction::Viewed => "viewed",
            ActivityAction::Searched => "searched",
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::PasswordChanged => "password_changed",
            ActivityAction::RoleChanged => "role_changed",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown activity action '{}'", s))
    }
}

/// Before/after pair for a single changed field.
///
/// `from` is omitted when the field did not exist before the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    pub to: Value,
}

/// Changed fields in the order they appeared in the update payload.
pub type Changes = IndexMap<String, FieldChange>;

/// Stored audit record in Firestore.
///
/// Field names are camelCase to stay compatible with records written by the
/// dashboard before this service existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Document ID (UUID v4)
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub action: ActivityAction,
    pub entity_type: ActivityType,
    pub entity_id: String,
    /// Display name at the time of the action
    pub entity_name: String,
    pub description: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(default)]
    pub changes: Changes,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// The already-authenticated user performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Admin privilege, required for retention management
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_spellings_round_trip_through_from_str() {
        for t in ActivityType::ALL {
            assert_eq!(t.as_str().parse::<ActivityType>().unwrap(), t);
        }
        for a in ActivityAction::ALL {
            assert_eq!(a.as_str().parse::<ActivityAction>().unwrap(), a);
        }
        assert!("widget".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_serde_spelling_matches_stored_values() {
        assert_eq!(
            serde_json::to_value(ActivityAction::PasswordChanged).unwrap(),
            Value::String("password_changed".to_string())
        );
        assert_eq!(
            serde_json::to_value(ActivityType::Mentor).unwrap(),
            Value::String("mentor".to_string())
        );
    }

    #[test]
    fn test_field_change_omits_missing_from() {
        let change = FieldChange {
            from: None,
            to: Value::from("new"),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({ "to": "new" })
        );
    }
}
