use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_helpers::{
    AppError, ValidatedJson,
    errors::responses::{BadRequestResponse, NotFoundResponse, ValidationErrorResponse},
};
use std::sync::Arc;

use crate::models::{
    CollectionDetails, CollectionsResponse, CreateCollectionRequest, CreateCollectionResponse,
    DeleteCollectionResponse,
};
use crate::repository::VectorRepository;
use crate::service::VectorService;

/// List collections with their point counts
#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All collections", body = CollectionsResponse),
        (status = 400, response = BadRequestResponse),
    )
)]
pub async fn list_collections<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
) -> Result<Json<CollectionsResponse>, AppError> {
    let collections = service.list_collections().await?;
    Ok(Json(CollectionsResponse { collections }))
}

/// Get one collection
#[utoipa::path(
    get,
    path = "/collections/{name}",
    tag = "collections",
    params(("name" = String, Path, description = "Collection name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Collection details", body = CollectionDetails),
        (status = 404, response = NotFoundResponse),
    )
)]
pub async fn get_collection<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    Path(name): Path<String>,
) -> Result<Json<CollectionDetails>, AppError> {
    Ok(Json(service.get_collection(&name).await?))
}

/// Create a collection
///
/// HNSW parameters are sent to Qdrant only when provided.
#[utoipa::path(
    post,
    path = "/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Collection created", body = CreateCollectionResponse),
        (status = 400, response = BadRequestResponse),
        (status = 422, response = ValidationErrorResponse),
    )
)]
pub async fn create_collection<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    ValidatedJson(request): ValidatedJson<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CreateCollectionResponse>), AppError> {
    let created = service.create_collection(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a collection
#[utoipa::path(
    delete,
    path = "/collections/{name}",
    tag = "collections",
    params(("name" = String, Path, description = "Collection name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Delete result", body = DeleteCollectionResponse),
        (status = 404, response = NotFoundResponse),
    )
)]
pub async fn delete_collection<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    Path(name): Path<String>,
) -> Result<Json<DeleteCollectionResponse>, AppError> {
    Ok(Json(service.delete_collection(&name).await?))
}
