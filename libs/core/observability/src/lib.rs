//! Observability utilities for the QuietVector API.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Vector store operation metrics
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, VectorMetrics};
//!
//! init_metrics()?;
//!
//! VectorMetrics::record_search("docs", 10, 12);
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod vector;

pub use middleware::metrics_middleware;
pub use vector::VectorMetrics;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup; later calls return the same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Vector store metrics
    describe_counter!(
        "vector_operations_total",
        "Vector store operations by operation and outcome"
    );
    describe_histogram!(
        "vector_operation_duration_seconds",
        "Vector store operation duration in seconds"
    );
    describe_counter!("vector_points_upserted_total", "Points written by insert");
    describe_counter!("vector_points_deleted_total", "Points removed by delete");
    describe_histogram!(
        "vector_search_results",
        "Number of hits returned per search"
    );
    describe_gauge!("vector_collections", "Collections seen by the last listing");
    describe_counter!(
        "snapshot_operations_total",
        "Snapshot operations by operation and outcome"
    );
}
