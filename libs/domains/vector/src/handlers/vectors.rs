use axum::{Json, extract::State};
use axum_helpers::{
    AppError, ValidatedJson,
    errors::responses::{BadRequestResponse, ValidationErrorResponse},
};
use std::sync::Arc;

use crate::models::{
    DeletePointsRequest, DeletePointsResponse, InsertVectorsRequest, InsertVectorsResponse,
    SearchRequest, SearchResponse,
};
use crate::repository::VectorRepository;
use crate::service::VectorService;

/// Upsert points into a collection
///
/// Every point must have the same dimension as the first one.
#[utoipa::path(
    post,
    path = "/vectors/insert",
    tag = "vectors",
    request_body = InsertVectorsRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Points stored", body = InsertVectorsResponse),
        (status = 400, response = BadRequestResponse),
        (status = 422, response = ValidationErrorResponse),
    )
)]
pub async fn insert_vectors<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    ValidatedJson(request): ValidatedJson<InsertVectorsRequest>,
) -> Result<Json<InsertVectorsResponse>, AppError> {
    Ok(Json(service.insert(request).await?))
}

/// Nearest-neighbour search
#[utoipa::path(
    post,
    path = "/vectors/search",
    tag = "vectors",
    request_body = SearchRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Scored hits", body = SearchResponse),
        (status = 400, response = BadRequestResponse),
        (status = 422, response = ValidationErrorResponse),
    )
)]
pub async fn search_vectors<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    Ok(Json(service.search(request).await?))
}

/// Delete points by id
#[utoipa::path(
    post,
    path = "/vectors/delete",
    tag = "vectors",
    request_body = DeletePointsRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Points deleted", body = DeletePointsResponse),
        (status = 400, response = BadRequestResponse),
        (status = 422, response = ValidationErrorResponse),
    )
)]
pub async fn delete_vectors<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
    ValidatedJson(request): ValidatedJson<DeletePointsRequest>,
) -> Result<Json<DeletePointsResponse>, AppError> {
    Ok(Json(service.delete_points(request).await?))
}
