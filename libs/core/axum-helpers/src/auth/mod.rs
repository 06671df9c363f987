//! Authentication and authorization module.
//!
//! This module provides:
//! - Stateless HS256 access tokens (`JwtAuth`)
//! - The `require_auth` guard for protected routes, with an optional
//!   shared API key checked before the bearer token
//! - The `AuthClaims` extractor for handlers behind the guard
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{AuthGuard, JwtAuth, JwtConfig, require_auth};
//! use core_config::FromEnv;
//!
//! let jwt = JwtAuth::new(&JwtConfig::from_env()?);
//! let guard = AuthGuard::new(jwt);
//!
//! let protected = Router::new()
//!     .route("/collections", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(guard, require_auth));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::{ApiKeyConfig, JwtConfig};
pub use jwt::{JwtAuth, JwtClaims, TOKEN_ISSUER};
pub use middleware::{AuthClaims, AuthGuard, API_KEY_HEADER, require_auth};
