mod client;
mod config;
mod snapshots;

pub use client::QdrantHttpClient;
pub use config::{DEFAULT_SNAPSHOT_UPLOAD_MAX_BYTES, QdrantConfig};
