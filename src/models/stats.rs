//! Activity log aggregates for the dashboard overview.
//!
//! Stores hand back flat `(type, action, count)` rows; this module folds them
//! into the nested per-type shape the dashboard renders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::activity::{ActivityAction, ActivityType};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One group-by row: number of records with this type and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeActionCount {
    pub activity_type: ActivityType,
    pub action: ActivityAction,
    pub count: u64,
}

/// Count of records for one action within a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActionCount {
    pub action: ActivityAction,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: u64,
}

/// Total and per-action breakdown for one activity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TypeStats {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    pub actions: Vec<ActionCount>,
}

/// Fold group-by rows into per-type stats.
///
/// Output order is unspecified.
pub fn aggregate_by_type(rows: &[TypeActionCount]) -> Vec<TypeStats> {
    let mut by_type: HashMap<ActivityType, TypeStats> = HashMap::new();

    for row in rows {
        let entry = by_type
            .entry(row.activity_type)
            .or_insert_with(|| TypeStats {
                activity_type: row.activity_type,
                total: 0,
                actions: Vec::new(),
            });

        entry.total += row.count;

        // Stores may return the same pair more than once (e.g. paged scans)
        match entry.actions.iter_mut().find(|a| a.action == row.action) {
            Some(existing) => existing.count += row.count,
            None => entry.actions.push(ActionCount {
                action: row.action,
                count: row.count,
            }),
        }
    }

    by_type.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: ActivityType, a: ActivityAction, count: u64) -> TypeActionCount {
        TypeActionCount {
            activity_type: t,
            action: a,
            count,
        }
    }

    fn find(stats: &[TypeStats], t: ActivityType) -> &TypeStats {
        stats.iter().find(|s| s.activity_type == t).unwrap()
    }

    fn action_count(stats: &TypeStats, a: ActivityAction) -> Option<u64> {
        stats.actions.iter().find(|c| c.action == a).map(|c| c.count)
    }

    #[test]
    fn test_aggregate_nested_counts() {
        let rows = vec![
            row(ActivityType::User, ActivityAction::Created, 3),
            row(ActivityType::User, ActivityAction::Updated, 2),
            row(ActivityType::Event, ActivityAction::Created, 1),
        ];

        let stats = aggregate_by_type(&rows);
        assert_eq!(stats.len(), 2);

        let user = find(&stats, ActivityType::User);
        assert_eq!(user.total, 5);
        assert_eq!(action_count(user, ActivityAction::Created), Some(3));
        assert_eq!(action_count(user, ActivityAction::Updated), Some(2));

        let event = find(&stats, ActivityType::Event);
        assert_eq!(event.total, 1);
        assert_eq!(action_count(event, ActivityAction::Created), Some(1));
    }

    #[test]
    fn test_aggregate_merges_duplicate_rows() {
        let rows = vec![
            row(ActivityType::Media, ActivityAction::Uploaded, 2),
            row(ActivityType::Media, ActivityAction::Uploaded, 4),
        ];

        let stats = aggregate_by_type(&rows);
        let media = find(&stats, ActivityType::Media);
        assert_eq!(media.total, 6);
        assert_eq!(media.actions.len(), 1);
        assert_eq!(action_count(media, ActivityAction::Uploaded), Some(6));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_by_type(&[]).is_empty());
    }
}
