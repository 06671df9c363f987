use domain_security::{OpTracker, OpUpdate, Operation, Stage};
use futures::future::join_all;
use observability::VectorMetrics;
use serde_json::{Map, Value, json};
use std::time::Instant;

use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionDetails, CollectionSummary, CreateCollectionRequest, CreateCollectionResponse,
    DeleteCollectionResponse, DeletePointsRequest, DeletePointsResponse, InsertVectorsRequest,
    InsertVectorsResponse, RestoreResponse, SearchHit, SearchRequest, SearchResponse,
    SnapshotListResponse, StatsItem, StatsResponse,
};
use crate::repository::{SnapshotRepository, SnapshotStream, VectorRepository};
use crate::spool::SpooledSnapshot;

pub const SNAPSHOT_RESTORE_KIND: &str = "snapshot_restore";

/// Collection, point and stats operations.
pub struct VectorService<R: VectorRepository> {
    repository: R,
}

impl<R: VectorRepository> VectorService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    // ===== Collection Management =====

    pub async fn list_collections(&self) -> VectorResult<Vec<CollectionSummary>> {
        let names = self.repository.list_collection_names().await?;
        let infos = join_all(names.iter().map(|name| self.repository.collection_info(name))).await;

        let mut summaries = Vec::with_capacity(names.len());
        for (name, info) in names.into_iter().zip(infos) {
            // Dropped between the two calls
            let Some(info) = info? else { continue };
            summaries.push(CollectionSummary {
                points_count: info.points_count,
                vectors_count: info.effective_vectors_count(),
                status: info.status,
                name,
            });
        }

        VectorMetrics::set_collections_count(summaries.len());
        Ok(summaries)
    }

    pub async fn get_collection(&self, name: &str) -> VectorResult<CollectionDetails> {
        let info = self
            .repository
            .collection_info(name)
            .await?
            .ok_or_else(|| VectorError::CollectionNotFound(name.to_string()))?;
        let count = self.repository.count_points(name).await?;

        Ok(CollectionDetails {
            name: name.to_string(),
            vectors_count: count,
            vector_size: info.vector_size.unwrap_or(0),
            distance: info.distance.unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    pub async fn create_collection(
        &self,
        request: &CreateCollectionRequest,
    ) -> VectorResult<CreateCollectionResponse> {
        let result = self.repository.create_collection(request).await;
        VectorMetrics::record_operation("create_collection", result.is_ok());
        result?;

        tracing::info!(
            collection = %request.name,
            size = request.vectors_size,
            distance = request.distance.as_str(),
            "Collection created"
        );
        Ok(CreateCollectionResponse {
            name: request.name.clone(),
            created: true,
        })
    }

    pub async fn delete_collection(&self, name: &str) -> VectorResult<DeleteCollectionResponse> {
        let result = self.repository.delete_collection(name).await;
        VectorMetrics::record_operation("delete_collection", result.is_ok());
        let deleted = result.map_err(|e| match e {
            VectorError::Qdrant(msg) => VectorError::CollectionNotFound(msg),
            other => other,
        })?;

        tracing::info!(collection = %name, deleted, "Collection delete requested");
        Ok(DeleteCollectionResponse { deleted })
    }

    // ===== Point Operations =====

    pub async fn insert(&self, request: InsertVectorsRequest) -> VectorResult<InsertVectorsResponse> {
        let inserted = request.points.len();
        let start = Instant::now();

        let result = self
            .repository
            .upsert_points(&request.collection, request.points)
            .await;
        match &result {
            Ok(()) => VectorMetrics::record_upsert(
                &request.collection,
                inserted,
                start.elapsed().as_millis() as u64,
            ),
            Err(_) => VectorMetrics::record_operation("upsert", false),
        }
        result?;

        Ok(InsertVectorsResponse { inserted })
    }

    pub async fn search(&self, request: SearchRequest) -> VectorResult<SearchResponse> {
        let start = Instant::now();

        let result = self
            .repository
            .search(
                &request.collection,
                request.vector,
                request.limit,
                request.with_payload,
            )
            .await;
        let points = match result {
            Ok(points) => points,
            Err(e) => {
                VectorMetrics::record_operation("search", false);
                return Err(e);
            }
        };

        VectorMetrics::record_search(
            &request.collection,
            points.len(),
            start.elapsed().as_millis() as u64,
        );

        let results = points
            .into_iter()
            .map(SearchHit::from)
            .map(|mut hit| {
                if !request.with_payload {
                    hit.payload = None;
                }
                hit
            })
            .collect();
        Ok(SearchResponse { results })
    }

    pub async fn delete_points(&self, request: DeletePointsRequest) -> VectorResult<DeletePointsResponse> {
        let deleted = request.ids.len();

        let result = self
            .repository
            .delete_points(&request.collection, request.ids)
            .await;
        VectorMetrics::record_operation("delete_points", result.is_ok());
        result?;

        VectorMetrics::record_points_deleted(&request.collection, deleted);
        Ok(DeletePointsResponse { deleted })
    }

    // ===== Stats =====

    pub async fn stats(&self) -> VectorResult<StatsResponse> {
        let collections = self.list_collections().await?;

        let total_points = collections.iter().map(|c| c.points_count).sum();
        let items = collections
            .into_iter()
            .map(|c| StatsItem {
                name: c.name,
                points_count: c.points_count,
                vectors_count: c.vectors_count,
            })
            .collect::<Vec<_>>();

        Ok(StatsResponse {
            collections: items.len(),
            total_points,
            items,
        })
    }

    pub async fn health(&self) -> VectorResult<()> {
        self.repository.health().await
    }
}

/// Snapshot proxying plus restore progress tracking.
///
/// A restore moves through `saving` (receiving the upload), `uploading`
/// (sending it to Qdrant), `verifying` and finally `completed` or `failed`.
pub struct SnapshotService<S: SnapshotRepository> {
    repository: S,
    ops: OpTracker,
}

impl<S: SnapshotRepository> SnapshotService<S> {
    pub fn new(repository: S, ops: OpTracker) -> Self {
        Self { repository, ops }
    }

    pub async fn list(&self, collection: &str) -> VectorResult<SnapshotListResponse> {
        let result = self.repository.list_snapshots(collection).await;
        VectorMetrics::record_snapshot("list", result.is_ok());
        Ok(SnapshotListResponse { result: result? })
    }

    pub async fn create(&self, collection: &str) -> VectorResult<Value> {
        let result = self.repository.create_snapshot(collection).await;
        VectorMetrics::record_snapshot("create", result.is_ok());
        if result.is_ok() {
            tracing::info!(collection, "Snapshot created");
        }
        result
    }

    pub async fn download(&self, collection: &str, name: &str) -> VectorResult<SnapshotStream> {
        let result = self.repository.download_snapshot(collection, name).await;
        VectorMetrics::record_snapshot("download", result.is_ok());
        result
    }

    /// Register a restore; the caller is now receiving the file.
    pub async fn begin_restore(&self, collection: &str) -> Operation {
        let mut meta = Map::new();
        meta.insert("collection".to_string(), json!(collection));
        let op = self.ops.create(SNAPSHOT_RESTORE_KIND, meta).await;
        self.advance(&op.id, OpUpdate::stage(Stage::Saving)).await;
        op
    }

    /// Mark a restore failed before the upload reached Qdrant.
    pub async fn abort_restore(&self, op_id: &str, error: &str) {
        VectorMetrics::record_snapshot("restore", false);
        self.advance(op_id, OpUpdate::failed(error)).await;
    }

    /// Forward the spooled upload to Qdrant. The spool file is removed
    /// when this returns.
    pub async fn complete_restore(
        &self,
        op_id: &str,
        collection: &str,
        snapshot: SpooledSnapshot,
    ) -> VectorResult<RestoreResponse> {
        self.advance(
            op_id,
            OpUpdate::stage(Stage::Uploading).with_meta("bytes_total", snapshot.len()),
        )
        .await;

        let result = match self
            .repository
            .upload_snapshot(collection, &snapshot)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.abort_restore(op_id, &e.to_string()).await;
                return Err(e);
            }
        };

        self.advance(op_id, OpUpdate::stage(Stage::Verifying)).await;
        if result.get("result") == Some(&Value::Bool(false)) {
            let message = "Qdrant did not confirm the restore".to_string();
            self.abort_restore(op_id, &message).await;
            return Err(VectorError::Upstream {
                status: 200,
                body: result.to_string(),
            });
        }

        self.advance(op_id, OpUpdate::stage(Stage::Completed)).await;
        VectorMetrics::record_snapshot("restore", true);
        tracing::info!(op_id, collection, "Snapshot restored");

        Ok(RestoreResponse {
            op_id: op_id.to_string(),
            result,
        })
    }

    pub async fn operation(&self, op_id: &str) -> Option<Operation> {
        self.ops.get(op_id).await
    }

    async fn advance(&self, op_id: &str, update: OpUpdate) {
        if let Err(e) = self.ops.update(op_id, update).await {
            tracing::warn!(error = %e, "Restore progress not recorded");
        }
    }
}
