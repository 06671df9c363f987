use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;

use crate::error::VectorResult;
use crate::models::{
    CollectionInfo, CreateCollectionRequest, Point, PointId, ScoredPoint, SnapshotDescription,
};
use crate::spool::SpooledSnapshot;

/// Streamed snapshot file contents.
pub type SnapshotStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Collection and point operations against the vector store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    // ===== Collection Management =====

    async fn list_collection_names(&self) -> VectorResult<Vec<String>>;

    /// `None` when the collection does not exist
    async fn collection_info(&self, name: &str) -> VectorResult<Option<CollectionInfo>>;

    /// Exact number of points in a collection
    async fn count_points(&self, name: &str) -> VectorResult<u64>;

    async fn create_collection(&self, request: &CreateCollectionRequest) -> VectorResult<()>;

    async fn delete_collection(&self, name: &str) -> VectorResult<bool>;

    // ===== Point Operations =====

    /// Upsert and wait until the points are persisted
    async fn upsert_points(&self, collection: &str, points: Vec<Point>) -> VectorResult<()>;

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u32,
        with_payload: bool,
    ) -> VectorResult<Vec<ScoredPoint>>;

    async fn delete_points(&self, collection: &str, ids: Vec<PointId>) -> VectorResult<()>;

    /// Reachability check
    async fn health(&self) -> VectorResult<()>;
}

/// Snapshot management, proxied straight to the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn list_snapshots(&self, collection: &str) -> VectorResult<Vec<SnapshotDescription>>;

    /// Returns the store's response body unchanged
    async fn create_snapshot(&self, collection: &str) -> VectorResult<serde_json::Value>;

    async fn download_snapshot(&self, collection: &str, name: &str) -> VectorResult<SnapshotStream>;

    /// Upload a spooled snapshot and restore the collection from it
    async fn upload_snapshot(
        &self,
        collection: &str,
        snapshot: &SpooledSnapshot,
    ) -> VectorResult<serde_json::Value>;
}
