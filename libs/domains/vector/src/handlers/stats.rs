use axum::{Json, extract::State};
use axum_helpers::AppError;
use std::sync::Arc;

use crate::models::StatsResponse;
use crate::repository::VectorRepository;
use crate::service::VectorService;

/// Point totals across all collections
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer" = [])),
    responses((status = 200, description = "Per-collection counts", body = StatsResponse))
)]
pub async fn get_stats<R: VectorRepository>(
    State(service): State<Arc<VectorService<R>>>,
) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(service.stats().await?))
}
