// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Activities (append-only audit log)
//! - Users (dashboard accounts)

use crate::db::{collections, ActivityFilter, ActivityStore};
use crate::error::AppError;
use crate::models::{ActivityAction, ActivityRecord, ActivityType, TypeActionCount, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::{FirestoreQueryDirection, FirestoreTimestamp};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 8;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Result row of a count aggregation.
#[derive(Debug, Deserialize)]
struct CountAggregate {
    count: u64,
}

/// Projection used for the type/action group-by.
#[derive(Debug, Deserialize)]
struct TypeActionRow {
    #[serde(rename = "type")]
    activity_type: ActivityType,
    action: ActivityAction,
}

/// Projection used when collecting ids to delete.
#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Helper to batch delete documents using transactions.
    ///
    /// Chunks are committed concurrently; each chunk is atomic on its own.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        stream::iter(ids.chunks(BATCH_SIZE).map(<[String]>::to_vec))
            .map(|chunk| self.delete_chunk(chunk, collection))
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Delete one chunk of at most `BATCH_SIZE` documents in a single transaction.
    async fn delete_chunk(&self, chunk: Vec<String>, collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for doc_id in &chunk {
            client
                .fluent()
                .delete()
                .from(collection)
                .document_id(doc_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit batch deletion: {}", e)))?;

        Ok(())
    }

    /// Ids of every activity created strictly before `cutoff`.
    async fn activity_ids_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, AppError> {
        let rows: Vec<IdRow> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["id"])
            .from(collections::ACTIVITIES)
            .filter(move |q| q.field("createdAt").less_than(FirestoreTimestamp(cutoff)))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    // ─── Activity Operations ─────────────────────────────────────

    async fn insert_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACTIVITIES)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_activities(
        &self,
        filter: &ActivityFilter,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let filter = filter.clone();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    filter
                        .user_id
                        .as_ref()
                        .and_then(|id| q.field("userId").eq(id.clone())),
                    filter
                        .activity_type
                        .and_then(|t| q.field("type").eq(t.as_str())),
                    filter.action.and_then(|a| q.field("action").eq(a.as_str())),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .offset(skip)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_activities(&self, filter: &ActivityFilter) -> Result<u64, AppError> {
        let filter = filter.clone();

        let rows: Vec<CountAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    filter
                        .user_id
                        .as_ref()
                        .and_then(|id| q.field("userId").eq(id.clone())),
                    filter
                        .activity_type
                        .and_then(|t| q.field("type").eq(t.as_str())),
                    filter.action.and_then(|a| q.field("action").eq(a.as_str())),
                ])
            })
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn find_activities_for_entity(
        &self,
        entity_type: ActivityType,
        entity_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let entity_id = entity_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("entityType").eq(entity_type.as_str()),
                    q.field("entityId").eq(entity_id.clone()),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let rows: Vec<CountAggregate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.field("createdAt").less_than(FirestoreTimestamp(cutoff)))
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn delete_activities_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let ids = self.activity_ids_before(cutoff).await?;
        let count = ids.len();

        self.batch_delete(&ids, collections::ACTIVITIES).await?;

        tracing::debug!(count, cutoff = %cutoff, "Deleted expired activities");
        Ok(count as u64)
    }

    async fn count_by_type_and_action(&self) -> Result<Vec<TypeActionCount>, AppError> {
        // Firestore has no group-by; project the two fields and fold in memory.
        let rows: Vec<TypeActionRow> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["type", "action"])
            .from(collections::ACTIVITIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut counts: HashMap<(ActivityType, ActivityAction), u64> = HashMap::new();
        for row in rows {
            *counts.entry((row.activity_type, row.action)).or_insert(0) += 1;
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

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        if self.get_user(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }
}
