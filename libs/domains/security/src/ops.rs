//! In-memory tracker for long-running operator actions.
//!
//! Snapshot restores and key rotations register an operation here so the
//! console can poll `GET /api/security/ops/{id}` for its stage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Created,
    Saving,
    Uploading,
    Verifying,
    Completed,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Operation {
    pub id: String,
    #[schema(example = "snapshot_restore")]
    pub kind: String,
    pub stage: Stage,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub meta: Map<String, Value>,
}

#[derive(Debug, Error)]
#[error("Operation not found: {0}")]
pub struct OpNotFound(pub String);

/// Partial update applied by [`OpTracker::update`].
///
/// `meta` entries are merged into the existing map, not replacing it.
#[derive(Debug, Default)]
pub struct OpUpdate {
    pub stage: Option<Stage>,
    pub error: Option<String>,
    pub meta: Map<String, Value>,
}

impl OpUpdate {
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            stage: Some(Stage::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// How long a completed or failed operation stays pollable.
pub const FINISHED_OP_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct OpTracker {
    ops: Arc<RwLock<HashMap<String, Operation>>>,
    ttl: Duration,
}

impl Default for OpTracker {
    fn default() -> Self {
        Self {
            ops: Arc::default(),
            ttl: Duration::hours(FINISHED_OP_TTL_HOURS),
        }
    }
}

impl OpTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Terminal operations idle for at least the TTL are dropped whenever a
    /// new one is created. Running operations are never dropped.
    fn prune(&self, ops: &mut HashMap<String, Operation>, now: DateTime<Utc>) {
        let before = ops.len();
        ops.retain(|_, op| !op.stage.is_terminal() || now - op.updated_at < self.ttl);
        let pruned = before - ops.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished operations");
        }
    }

    pub async fn create(&self, kind: &str, meta: Map<String, Value>) -> Operation {
        let now = Utc::now();
        let op = Operation {
            id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            stage: Stage::Created,
            error: None,
            created_at: now,
            updated_at: now,
            meta,
        };

        let mut ops = self.ops.write().await;
        self.prune(&mut ops, now);
        ops.insert(op.id.clone(), op.clone());
        drop(ops);
        tracing::debug!(op_id = %op.id, kind, "Operation created");
        op
    }

    pub async fn update(&self, id: &str, update: OpUpdate) -> Result<Operation, OpNotFound> {
        let mut ops = self.ops.write().await;
        let op = ops.get_mut(id).ok_or_else(|| OpNotFound(id.to_string()))?;

        if let Some(stage) = update.stage {
            op.stage = stage;
        }
        if update.error.is_some() {
            op.error = update.error;
        }
        op.meta.extend(update.meta);
        op.updated_at = Utc::now();

        tracing::debug!(op_id = %id, stage = ?op.stage, "Operation updated");
        Ok(op.clone())
    }

    pub async fn get(&self, id: &str) -> Option<Operation> {
        self.ops.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_create_starts_in_created_stage() {
        let tracker = OpTracker::new();
        let op = tracker
            .create("snapshot_restore", meta(json!({"collection": "docs"})))
            .await;

        assert_eq!(op.stage, Stage::Created);
        assert_eq!(op.kind, "snapshot_restore");
        assert!(op.error.is_none());
        assert_eq!(tracker.get(&op.id).await, Some(op));
    }

    #[tokio::test]
    async fn test_update_merges_meta_and_sets_stage() {
        let tracker = OpTracker::new();
        let op = tracker.create("x", meta(json!({"a": 1}))).await;

        let updated = tracker
            .update(&op.id, OpUpdate::stage(Stage::Uploading).with_meta("b", 2))
            .await
            .unwrap();
        assert_eq!(updated.stage, Stage::Uploading);
        assert_eq!(updated.meta["a"], 1);
        assert_eq!(updated.meta["b"], 2);
        assert!(updated.updated_at >= updated.created_at);

        let failed = tracker.update(&op.id, OpUpdate::failed("boom")).await.unwrap();
        assert_eq!(failed.stage, Stage::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.stage.is_terminal());
    }

    #[tokio::test]
    async fn test_update_without_stage_keeps_stage() {
        let tracker = OpTracker::new();
        let op = tracker.create("x", Map::new()).await;
        tracker
            .update(&op.id, OpUpdate::stage(Stage::Saving))
            .await
            .unwrap();

        let updated = tracker
            .update(&op.id, OpUpdate::default().with_meta("bytes_total", 10))
            .await
            .unwrap();
        assert_eq!(updated.stage, Stage::Saving);
    }

    #[tokio::test]
    async fn test_update_unknown_op() {
        let tracker = OpTracker::new();
        let err = tracker.update("missing", OpUpdate::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Operation not found: missing");
        assert!(tracker.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_create_prunes_finished_ops_past_ttl() {
        let tracker = OpTracker::new().with_ttl(Duration::zero());
        let done = tracker.create("x", Map::new()).await;
        tracker
            .update(&done.id, OpUpdate::stage(Stage::Completed))
            .await
            .unwrap();
        let failed = tracker.create("x", Map::new()).await;
        tracker.update(&failed.id, OpUpdate::failed("boom")).await.unwrap();
        let running = tracker.create("x", Map::new()).await;
        tracker
            .update(&running.id, OpUpdate::stage(Stage::Uploading))
            .await
            .unwrap();

        let fresh = tracker.create("x", Map::new()).await;

        assert!(tracker.get(&done.id).await.is_none());
        assert!(tracker.get(&failed.id).await.is_none());
        assert!(tracker.get(&running.id).await.is_some());
        assert!(tracker.get(&fresh.id).await.is_some());
    }

    #[tokio::test]
    async fn test_finished_ops_within_ttl_are_kept() {
        let tracker = OpTracker::new();
        let done = tracker.create("x", Map::new()).await;
        tracker
            .update(&done.id, OpUpdate::stage(Stage::Completed))
            .await
            .unwrap();

        tracker.create("x", Map::new()).await;
        assert_eq!(tracker.get(&done.id).await.unwrap().stage, Stage::Completed);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Stage::Verifying).unwrap(), json!("verifying"));
    }
}
