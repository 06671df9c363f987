//! Qdrant-backed collections, points, snapshots and stats.
//!
//! ```text
//!  handlers ─► VectorService<R> ──► VectorRepository ─┐
//!          └─► SnapshotService<S> ─► SnapshotRepository ┴─► QdrantHttpClient ─► Qdrant REST
//! ```
//!
//! `QdrantHttpClient` also implements [`domain_security::KeyReloader`], so a
//! key rotated on disk is picked up without restarting the API.
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_security::OpTracker;
//! use domain_vector::{QdrantConfig, QdrantHttpClient, SnapshotService, VectorService};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QdrantConfig::from_env()?;
//! let client = QdrantHttpClient::new(&config)?;
//!
//! let vectors = VectorService::new(client.clone());
//! let snapshots = SnapshotService::new(client, OpTracker::new());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;
pub mod spool;
mod validation;

pub use error::{VectorError, VectorResult};
pub use handlers::{SnapshotApiDoc, VectorApiDoc, snapshot_router, vector_router};
pub use models::{
    CollectionDetails, CollectionSummary, CreateCollectionRequest, Distance, Point, PointId,
    SearchRequest, SnapshotDescription,
};
pub use qdrant::{DEFAULT_SNAPSHOT_UPLOAD_MAX_BYTES, QdrantConfig, QdrantHttpClient};
pub use repository::{SnapshotRepository, SnapshotStream, VectorRepository};
pub use service::{SNAPSHOT_RESTORE_KIND, SnapshotService, VectorService};
pub use spool::{SnapshotSpool, SpooledSnapshot};
pub use validation::MAX_VECTOR_DIMENSION;
