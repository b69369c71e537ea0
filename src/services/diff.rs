// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field-level change tracking for audited updates.

use crate::models::{Changes, FieldChange};
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields that must never reach the audit log.
const SECRET_FIELDS: &[&str] = &["password", "passwordHash", "password_hash"];

/// Diff an entity snapshot against an incoming partial update.
///
/// Only keys present in `incoming` are considered, in the order they appear
/// there. Equality is shallow: scalars compare by value (numbers
/// numerically), while objects and arrays always count as changed.
pub fn diff_changes(original: &Map<String, Value>, incoming: &Map<String, Value>) -> Changes {
    incoming
        .iter()
        .filter_map(|(field, new_value)| {
            let old_value = original.get(field);
            if old_value.is_some_and(|old| shallow_eq(old, new_value)) {
                return None;
            }
            Some((
                field.clone(),
                FieldChange {
                    from: old_value.cloned(),
                    to: new_value.clone(),
                },
            ))
        })
        .collect()
}

fn shallow_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

/// Serialize an entity into a diffable snapshot with secret fields removed.
///
/// Non-object values produce an empty snapshot.
pub fn snapshot_without_secrets<T: Serialize>(entity: &T) -> Map<String, Value> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(mut map)) => {
            for field in SECRET_FIELDS {
                map.remove(*field);
            }
            map
        }
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to snapshot entity for change tracking");
            Map::new()
        }
    }
}
