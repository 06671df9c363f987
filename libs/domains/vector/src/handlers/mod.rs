//! HTTP surface of the vector domain.
//!
//! Routes are relative; the app nests them under `/api`.

mod collections;
mod snapshots;
mod stats;
mod vectors;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_helpers::errors::responses::{
    BadGatewayResponse, BadRequestResponse, NotFoundResponse, PayloadTooLargeResponse,
    ValidationErrorResponse,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    CollectionDetails, CollectionSummary, CollectionsResponse, CreateCollectionRequest,
    CreateCollectionResponse, DeleteCollectionResponse, DeletePointsRequest, DeletePointsResponse,
    Distance, InsertVectorsRequest, InsertVectorsResponse, Point, PointId, RestoreResponse,
    SearchHit, SearchRequest, SearchResponse, SnapshotDescription, SnapshotListResponse,
    StatsItem, StatsResponse,
};
use crate::repository::{SnapshotRepository, VectorRepository};
use crate::service::{SnapshotService, VectorService};

pub use snapshots::SNAPSHOT_FIELDS;

/// OpenAPI documentation for collections, points and stats
#[derive(OpenApi)]
#[openapi(
    paths(
        collections::list_collections,
        collections::get_collection,
        collections::create_collection,
        collections::delete_collection,
        vectors::insert_vectors,
        vectors::search_vectors,
        vectors::delete_vectors,
        stats::get_stats,
    ),
    components(
        schemas(
            CollectionSummary, CollectionsResponse, CollectionDetails,
            CreateCollectionRequest, CreateCollectionResponse, DeleteCollectionResponse,
            Distance, Point, PointId,
            InsertVectorsRequest, InsertVectorsResponse,
            SearchRequest, SearchResponse, SearchHit,
            DeletePointsRequest, DeletePointsResponse,
            StatsItem, StatsResponse
        ),
        responses(BadRequestResponse, NotFoundResponse, ValidationErrorResponse)
    ),
    tags(
        (name = "collections", description = "Qdrant collection management"),
        (name = "vectors", description = "Point upsert, search and delete"),
        (name = "stats", description = "Aggregate counts")
    )
)]
pub struct VectorApiDoc;

/// OpenAPI documentation for snapshot transfer
#[derive(OpenApi)]
#[openapi(
    paths(
        snapshots::list_snapshots,
        snapshots::create_snapshot,
        snapshots::download_snapshot,
        snapshots::restore_snapshot,
    ),
    components(
        schemas(SnapshotDescription, SnapshotListResponse, RestoreResponse),
        responses(BadGatewayResponse, BadRequestResponse, PayloadTooLargeResponse)
    ),
    tags((name = "snapshots", description = "Snapshot create, download and restore"))
)]
pub struct SnapshotApiDoc;

/// Collections, points and stats.
pub fn vector_router<R: VectorRepository + 'static>(service: Arc<VectorService<R>>) -> Router {
    Router::new()
        .route(
            "/collections",
            get(collections::list_collections::<R>).post(collections::create_collection::<R>),
        )
        .route(
            "/collections/{name}",
            get(collections::get_collection::<R>).delete(collections::delete_collection::<R>),
        )
        .route("/vectors/insert", post(vectors::insert_vectors::<R>))
        .route("/vectors/search", post(vectors::search_vectors::<R>))
        .route("/vectors/delete", post(vectors::delete_vectors::<R>))
        .route("/stats", get(stats::get_stats::<R>))
        .with_state(service)
}

/// Snapshot routes. The restore route accepts bodies up to `upload_limit`
/// bytes, overriding the global body limit.
pub fn snapshot_router<S: SnapshotRepository + 'static>(
    service: Arc<SnapshotService<S>>,
    upload_limit: usize,
) -> Router {
    Router::new()
        .route(
            "/snapshots/{collection}",
            get(snapshots::list_snapshots::<S>).post(snapshots::create_snapshot::<S>),
        )
        .route(
            "/snapshots/{collection}/restore",
            post(snapshots::restore_snapshot::<S>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/snapshots/{collection}/{name}",
            get(snapshots::download_snapshot::<S>),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;
    use crate::models::{CollectionInfo, ScoredPoint};
    use crate::repository::{MockSnapshotRepository, MockVectorRepository};
    use axum::{
        body::{Body, Bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use axum_helpers::ErrorResponse;
    use domain_security::{OpTracker, Stage};
    use futures::stream;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BOUNDARY: &str = "quietvector-boundary";

    fn vectors_app(repo: MockVectorRepository) -> Router {
        vector_router(Arc::new(VectorService::new(repo)))
    }

    fn snapshots_app(repo: MockSnapshotRepository, ops: OpTracker) -> Router {
        snapshot_router(Arc::new(SnapshotService::new(repo, ops)), 1024 * 1024)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_body(field: &str, contents: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"s1.snapshot\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request_with(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    fn multipart_request(uri: &str, field: &str, contents: &[u8]) -> Request<Body> {
        multipart_request_with(uri, Body::from(multipart_body(field, contents)))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn error_body(response: Response) -> ErrorResponse {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_collections_route() {
        let mut repo = MockVectorRepository::new();
        repo.expect_list_collection_names()
            .returning(|| Ok(vec!["docs".to_string()]));
        repo.expect_collection_info().returning(|_| {
            Ok(Some(CollectionInfo {
                status: "green".to_string(),
                points_count: 3,
                ..Default::default()
            }))
        });

        let response = vectors_app(repo)
            .oneshot(Request::builder().uri("/collections").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["collections"][0]["name"], "docs");
        assert_eq!(body["collections"][0]["vectors_count"], 3);
    }

    #[tokio::test]
    async fn test_create_collection_returns_201() {
        let mut repo = MockVectorRepository::new();
        repo.expect_create_collection()
            .withf(|req| req.name == "docs" && req.vectors_size == 4 && req.m.is_none())
            .returning(|_| Ok(()));

        let response = vectors_app(repo)
            .oneshot(json_request(
                "POST",
                "/collections",
                json!({"name": "docs", "vectors_size": 4, "distance": "Dot"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await, json!({"name": "docs", "created": true}));
    }

    #[tokio::test]
    async fn test_create_collection_rejected_upstream_is_400() {
        let mut repo = MockVectorRepository::new();
        repo.expect_create_collection().returning(|_| {
            Err(VectorError::CreateFailed(
                "Collection `docs` already exists!".to_string(),
            ))
        });

        let response = vectors_app(repo)
            .oneshot(json_request(
                "POST",
                "/collections",
                json!({"name": "docs", "vectors_size": 4}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(response).await.message,
            "Failed to create collection: Collection `docs` already exists!"
        );
    }

    #[tokio::test]
    async fn test_create_collection_validates_hnsw_bounds() {
        let response = vectors_app(MockVectorRepository::new())
            .oneshot(json_request(
                "POST",
                "/collections",
                json!({"name": "docs", "vectors_size": 4, "m": 2}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_unknown_collection_is_404() {
        let mut repo = MockVectorRepository::new();
        repo.expect_collection_info().returning(|_| Ok(None));

        let response = vectors_app(repo)
            .oneshot(Request::builder().uri("/collections/ghost").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await.message, "Collection not found: ghost");
    }

    #[tokio::test]
    async fn test_delete_collection_failure_is_404() {
        let mut repo = MockVectorRepository::new();
        repo.expect_delete_collection()
            .returning(|_| Err(VectorError::Qdrant("boom".to_string())));

        let response = vectors_app(repo)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/collections/docs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insert_dimension_mismatch_is_rejected() {
        let response = vectors_app(MockVectorRepository::new())
            .oneshot(json_request(
                "POST",
                "/vectors/insert",
                json!({
                    "collection": "docs",
                    "points": [
                        {"id": 1, "vector": [0.1, 0.2]},
                        {"id": 2, "vector": [0.1]}
                    ]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_search_route_stringifies_ids() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .withf(|collection, vector, limit, with_payload| {
                collection == "docs" && vector.len() == 2 && *limit == 10 && *with_payload
            })
            .returning(|_, _, _, _| {
                Ok(vec![ScoredPoint {
                    id: PointId::Num(7),
                    score: 0.5,
                    payload: Some(json!({"title": "seven"})),
                }])
            });

        let response = vectors_app(repo)
            .oneshot(json_request(
                "POST",
                "/vectors/search",
                json!({"collection": "docs", "vector": [0.1, 0.2]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["results"][0]["id"], "7");
        assert_eq!(body["results"][0]["payload"]["title"], "seven");
    }

    #[tokio::test]
    async fn test_search_limit_out_of_range() {
        let response = vectors_app(MockVectorRepository::new())
            .oneshot(json_request(
                "POST",
                "/vectors/search",
                json!({"collection": "docs", "vector": [0.1], "limit": 500}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_vectors_route() {
        let mut repo = MockVectorRepository::new();
        repo.expect_delete_points().returning(|_, _| Ok(()));

        let response = vectors_app(repo)
            .oneshot(json_request(
                "POST",
                "/vectors/delete",
                json!({"collection": "docs", "ids": [1, "2", "0b1f5f9e-4a39-4f7c-9d4d-7c1b0f0f6a11"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"deleted": 3}));
    }

    #[tokio::test]
    async fn test_stats_route() {
        let mut repo = MockVectorRepository::new();
        repo.expect_list_collection_names().returning(|| Ok(vec![]));

        let response = vectors_app(repo)
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"collections": 0, "total_points": 0, "items": []})
        );
    }

    #[tokio::test]
    async fn test_download_sets_attachment_headers() {
        let mut repo = MockSnapshotRepository::new();
        repo.expect_download_snapshot().returning(|_, _| {
            Ok(Box::pin(stream::iter(vec![
                Ok(Bytes::from_static(b"snap")),
                Ok(Bytes::from_static(b"shot")),
            ])))
        });

        let response = snapshots_app(repo, OpTracker::new())
            .oneshot(
                Request::builder()
                    .uri("/snapshots/docs/s1.snapshot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=s1.snapshot"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"snapshot");
    }

    #[tokio::test]
    async fn test_create_snapshot_upstream_error_is_502() {
        let mut repo = MockSnapshotRepository::new();
        repo.expect_create_snapshot().returning(|_| {
            Err(VectorError::Upstream {
                status: 500,
                body: "oops".to_string(),
            })
        });

        let response = snapshots_app(repo, OpTracker::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/snapshots/docs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(response).await.message, "Qdrant returned 500: oops");
    }

    #[tokio::test]
    async fn test_restore_accepts_snapshot_field() {
        let mut repo = MockSnapshotRepository::new();
        repo.expect_upload_snapshot()
            .withf(|collection, snapshot| {
                collection == "docs"
                    && snapshot.file_name() == "s1.snapshot"
                    && std::fs::read(snapshot.path()).unwrap() == b"payload"
            })
            .returning(|_, _| Ok(json!({"result": true})));

        let ops = OpTracker::new();
        let response = snapshots_app(repo, ops.clone())
            .oneshot(multipart_request("/snapshots/docs/restore", "snapshot", b"payload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let op = ops.get(body["op_id"].as_str().unwrap()).await.unwrap();
        assert_eq!(op.stage, Stage::Completed);
        assert_eq!(op.meta["bytes_total"], 7);
    }

    #[tokio::test]
    async fn test_restore_without_file_is_400() {
        let ops = OpTracker::new();
        let response = snapshots_app(MockSnapshotRepository::new(), ops)
            .oneshot(multipart_request("/snapshots/docs/restore", "other", b"payload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(response).await.message,
            "Missing snapshot file (field 'file' or 'snapshot')"
        );
    }

    #[tokio::test]
    async fn test_restore_over_upload_limit_is_413() {
        let service = Arc::new(SnapshotService::new(
            MockSnapshotRepository::new(),
            OpTracker::new(),
        ));
        let app = snapshot_router(service, 16);

        let response = app
            .oneshot(multipart_request(
                "/snapshots/docs/restore",
                "file",
                &[0u8; 64],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_chunked_restore_reaches_qdrant_intact() {
        use crate::qdrant::{QdrantConfig, QdrantHttpClient};
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let qdrant = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/docs/snapshots/upload"))
            .and(query_param("priority", "snapshot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
            .expect(1)
            .mount(&qdrant)
            .await;
        let address = qdrant.address();
        let client =
            QdrantHttpClient::new(&QdrantConfig::new(address.ip().to_string(), address.port()))
                .unwrap();

        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let chunks: Vec<Result<Bytes, std::io::Error>> = multipart_body("file", &payload)
            .chunks(8 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let ops = OpTracker::new();
        let service = Arc::new(SnapshotService::new(client, ops.clone()));
        let response = snapshot_router(service, 1024 * 1024)
            .oneshot(multipart_request_with(
                "/snapshots/docs/restore",
                Body::from_stream(stream::iter(chunks)),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let op = ops.get(body["op_id"].as_str().unwrap()).await.unwrap();
        assert_eq!(op.stage, Stage::Completed);
        assert_eq!(op.meta["bytes_total"], 200_000);

        let received = qdrant.received_requests().await.unwrap();
        assert!(
            received[0]
                .body
                .windows(payload.len())
                .any(|window| window == payload.as_slice())
        );
    }
}
