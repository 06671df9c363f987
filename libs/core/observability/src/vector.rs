//! Vector store metrics.

use metrics::{counter, gauge, histogram};

pub struct VectorMetrics;

impl VectorMetrics {
    fn outcome(ok: bool) -> &'static str {
        if ok { "success" } else { "error" }
    }

    /// Record a search and the number of hits it returned.
    pub fn record_search(collection: &str, results: usize, duration_ms: u64) {
        counter!(
            "vector_operations_total",
            "operation" => "search",
            "collection" => collection.to_string(),
            "outcome" => "success"
        )
        .increment(1);
        histogram!("vector_operation_duration_seconds", "operation" => "search")
            .record(duration_ms as f64 / 1000.0);
        histogram!("vector_search_results").record(results as f64);

        tracing::debug!(collection, results, duration_ms, "Search completed");
    }

    pub fn record_upsert(collection: &str, points: usize, duration_ms: u64) {
        counter!(
            "vector_operations_total",
            "operation" => "upsert",
            "collection" => collection.to_string(),
            "outcome" => "success"
        )
        .increment(1);
        counter!("vector_points_upserted_total", "collection" => collection.to_string())
            .increment(points as u64);
        histogram!("vector_operation_duration_seconds", "operation" => "upsert")
            .record(duration_ms as f64 / 1000.0);
    }

    pub fn record_points_deleted(collection: &str, points: usize) {
        counter!("vector_points_deleted_total", "collection" => collection.to_string())
            .increment(points as u64);
    }

    /// Collection lifecycle and failed point operations.
    pub fn record_operation(operation: &'static str, ok: bool) {
        counter!(
            "vector_operations_total",
            "operation" => operation,
            "outcome" => Self::outcome(ok)
        )
        .increment(1);
    }

    pub fn set_collections_count(count: usize) {
        gauge!("vector_collections").set(count as f64);
    }

    pub fn record_snapshot(operation: &'static str, ok: bool) {
        counter!(
            "snapshot_operations_total",
            "operation" => operation,
            "outcome" => Self::outcome(ok)
        )
        .increment(1);
    }
}
