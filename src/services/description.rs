// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Human-readable sentences for audit records.
//!
//! The sentence is generated once when the record is written and stored
//! alongside it; it is never parsed back.

use crate::models::{ActivityAction, ActivityType, Changes};

fn label(category: ActivityType) -> &'static str {
    match category {
        ActivityType::User => "User",
        ActivityType::Event => "Event",
        ActivityType::Mentor => "Mentor",
        ActivityType::Country => "Country",
        ActivityType::Media => "Media",
        ActivityType::System => "System",
    }
}

/// Build the description for an audited action.
///
/// `changes` is only consulted for [`ActivityAction::Updated`].
pub fn describe(
    category: ActivityType,
    action: ActivityAction,
    entity_name: &str,
    changes: Option<&Changes>,
) -> String {
    use ActivityAction::*;
    use ActivityType as T;

    let sentence = match (category, action) {
        (T::User, Login) => format!("User \"{}\" logged in", entity_name),
        (T::User, Logout) => format!("User \"{}\" logged out", entity_name),
        (T::User, PasswordChanged) => {
            format!("User \"{}\" changed their password", entity_name)
        }
        (T::User, RoleChanged) => format!("User \"{}\" role was changed", entity_name),
        (T::User, Created | Updated | Deleted | Activated | Deactivated)
        | (T::Event, Created | Updated | Deleted | Reordered)
        | (T::Mentor, Created | Updated | Deleted | Reordered | Activated | Deactivated)
        | (T::Country, Created | Updated | Deleted)
        | (T::Media, Uploaded | Downloaded | Deleted | Viewed) => {
            format!("{} \"{}\" was {}", label(category), entity_name, action)
        }
        (T::Event, Joined) => format!("Joined event \"{}\"", entity_name),
        (T::Event, Left) => format!("Left event \"{}\"", entity_name),
        (T::System, Searched) => format!("Search performed: \"{}\"", entity_name),
        _ => format!("{} {}", action, entity_name),
    };

    match changes {
        Some(changes) if action == Updated && !changes.is_empty() => {
            let fields: Vec<&str> = changes.keys().map(String::as_str).collect();
            format!("{} ({} changed)", sentence, fields.join(", "))
        }
        _ => sentence,
    }
}
