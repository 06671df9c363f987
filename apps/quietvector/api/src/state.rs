//! Shared application state.
//!
//! One `QdrantHttpClient` backs the vector, snapshot and security services,
//! so a key reload triggered by ops apply is seen by every route. Snapshot
//! restores and key rotations share one `OpTracker`.

use axum_helpers::{AuthGuard, JwtAuth};
use domain_auth::{AuthService, AuthState};
use domain_security::{OpTracker, SecurityService, TokioCommandRunner};
use domain_vector::{QdrantHttpClient, SnapshotService, VectorService};
use std::sync::Arc;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub qdrant: QdrantHttpClient,
    pub guard: AuthGuard,
    pub auth: AuthState,
    pub vectors: Arc<VectorService<QdrantHttpClient>>,
    pub snapshots: Arc<SnapshotService<QdrantHttpClient>>,
    pub security: Arc<SecurityService<TokioCommandRunner, QdrantHttpClient>>,
}

impl AppState {
    pub fn new(config: Config) -> eyre::Result<Self> {
        let qdrant = QdrantHttpClient::new(&config.qdrant)?;
        let ops = OpTracker::new();

        let jwt = JwtAuth::new(&config.jwt);
        let guard = AuthGuard::new(jwt.clone()).with_api_key(config.api_key.required_key.clone());
        let auth_service = Arc::new(AuthService::new(config.admin.clone(), jwt));

        let security = SecurityService::new(
            auth_service.clone(),
            config.security.clone(),
            ops.clone(),
            TokioCommandRunner,
            qdrant.clone(),
        );

        Ok(Self {
            auth: AuthState {
                service: auth_service,
                secure_cookie: config.secure_cookie(),
            },
            guard,
            vectors: Arc::new(VectorService::new(qdrant.clone())),
            snapshots: Arc::new(SnapshotService::new(qdrant.clone(), ops)),
            security: Arc::new(security),
            qdrant,
            config,
        })
    }
}
