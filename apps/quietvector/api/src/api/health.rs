//! Readiness and metrics endpoints

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use domain_vector::{QdrantHttpClient, VectorRepository};
use observability::metrics_handler;

/// Create the readiness and metrics router
pub fn router(qdrant: QdrantHttpClient) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .with_state(qdrant)
}

/// Readiness check - verifies Qdrant answers `/healthz`
async fn readiness_check(State(qdrant): State<QdrantHttpClient>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "qdrant",
        Box::pin(async { qdrant.health().await.map_err(|e| e.to_string()) }),
    )];

    match run_health_checks(checks).await {
        Ok(ready) => ready,
        Err(not_ready) => not_ready,
    }
}
