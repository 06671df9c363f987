//! # Axum Helpers
//!
//! Shared building blocks for the QuietVector HTTP service.
//!
//! ## Modules
//!
//! - **[`auth`]**: HS256 access tokens and the bearer/API-key guard
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//! - **[`http`]**: request pipeline middleware (request id, body size, rate
//!   limit, CSRF, CORS, security headers)
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: validated JSON extractor
//! - **[`audit`]**: security events and the per-request audit file
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::{HttpConfig, server::{create_production_app, create_router}};
//! use core_config::{FromEnv, server::ServerConfig};
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes, &HttpConfig::from_env()?).await?;
//!
//!     create_production_app(router, &ServerConfig::from_env()?, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    ApiKeyConfig, AuthClaims, AuthGuard, JwtAuth, JwtClaims, JwtConfig, TOKEN_ISSUER,
    require_auth,
};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks,
};

pub use http::{
    CsrfConfig, HttpConfig, RequestId, constant_time_eq, csrf_cookie, generate_csrf_token,
    security_headers,
};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::ValidatedJson;

pub use audit::{
    AuditEvent, AuditLog, AuditOutcome, extract_ip_from_headers, extract_ip_from_socket,
    extract_user_agent,
};
