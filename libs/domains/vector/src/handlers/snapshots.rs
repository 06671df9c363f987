use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use axum_helpers::{
    AppError,
    errors::responses::{BadGatewayResponse, BadRequestResponse, PayloadTooLargeResponse},
};
use serde_json::Value;
use std::sync::Arc;

use crate::models::{RestoreResponse, SnapshotListResponse};
use crate::repository::SnapshotRepository;
use crate::service::SnapshotService;
use crate::spool::{SnapshotSpool, SpooledSnapshot};

/// Multipart field names accepted for the snapshot file.
pub const SNAPSHOT_FIELDS: [&str; 2] = ["file", "snapshot"];

/// List snapshots of a collection
#[utoipa::path(
    get,
    path = "/snapshots/{collection}",
    tag = "snapshots",
    params(("collection" = String, Path, description = "Collection name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Snapshots known to Qdrant", body = SnapshotListResponse),
        (status = 502, response = BadGatewayResponse),
    )
)]
pub async fn list_snapshots<S: SnapshotRepository>(
    State(service): State<Arc<SnapshotService<S>>>,
    Path(collection): Path<String>,
) -> Result<Json<SnapshotListResponse>, AppError> {
    Ok(Json(service.list(&collection).await?))
}

/// Create a snapshot and wait for it
#[utoipa::path(
    post,
    path = "/snapshots/{collection}",
    tag = "snapshots",
    params(("collection" = String, Path, description = "Collection name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Qdrant response", body = Object),
        (status = 502, response = BadGatewayResponse),
    )
)]
pub async fn create_snapshot<S: SnapshotRepository>(
    State(service): State<Arc<SnapshotService<S>>>,
    Path(collection): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(service.create(&collection).await?))
}

/// Download a snapshot file
#[utoipa::path(
    get,
    path = "/snapshots/{collection}/{name}",
    tag = "snapshots",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("name" = String, Path, description = "Snapshot file name"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Snapshot bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
    )
)]
pub async fn download_snapshot<S: SnapshotRepository>(
    State(service): State<Arc<SnapshotService<S>>>,
    Path((collection, name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={name}"))
        .map_err(|_| AppError::BadRequest(format!("Invalid snapshot name: {name}")))?;
    let stream = service.download(&collection, &name).await?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Restore a collection from an uploaded snapshot
///
/// Poll `GET /api/security/ops/{op_id}` for progress.
#[utoipa::path(
    post,
    path = "/snapshots/{collection}/restore",
    tag = "snapshots",
    params(("collection" = String, Path, description = "Collection name")),
    request_body(content_type = "multipart/form-data", description = "Snapshot file in field `file` or `snapshot`"),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Restore finished", body = RestoreResponse),
        (status = 400, response = BadRequestResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 502, response = BadGatewayResponse),
    )
)]
pub async fn restore_snapshot<S: SnapshotRepository>(
    State(service): State<Arc<SnapshotService<S>>>,
    Path(collection): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<RestoreResponse>, AppError> {
    let op = service.begin_restore(&collection).await;

    let snapshot = match spool_snapshot_file(&mut multipart).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            service.abort_restore(&op.id, &e.to_string()).await;
            return Err(e);
        }
    };

    let restored = service
        .complete_restore(&op.id, &collection, snapshot)
        .await?;
    Ok(Json(restored))
}

/// Stream the snapshot field to a temporary file, chunk by chunk.
async fn spool_snapshot_file(multipart: &mut Multipart) -> Result<SpooledSnapshot, AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_snapshot = field
            .name()
            .is_some_and(|name| SNAPSHOT_FIELDS.contains(&name));
        if !is_snapshot {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or("upload.snapshot")
            .to_string();

        let mut spool = SnapshotSpool::new(file_name).await?;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            spool.write(&chunk).await?;
        }
        return Ok(spool.finish().await?);
    }

    Err(AppError::BadRequest(
        "Missing snapshot file (field 'file' or 'snapshot')".to_string(),
    ))
}

fn multipart_error(err: MultipartError) -> AppError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
        _ => AppError::BadRequest(err.body_text()),
    }
}
