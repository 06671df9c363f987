//! HTTP middleware module.
//!
//! This module provides HTTP-level middleware for:
//! - Request ids and completion logs
//! - Request body size limits
//! - Per-client rate limiting
//! - CSRF protection (double submit cookie)
//! - CORS configuration
//! - Security headers
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{HttpConfig, create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&config.frontend_origins));
//! ```

pub mod body_limit;
pub mod config;
pub mod cors;
pub mod csrf;
pub mod path_pattern;
pub mod rate_limit;
pub mod request_id;
pub mod security;

// Re-export commonly used functions
pub use body_limit::{BodyLimit, body_limit_middleware};
pub use config::HttpConfig;
pub use cors::create_cors_layer;
pub use csrf::{
    CSRF_COOKIE, CSRF_HEADER, CsrfConfig, constant_time_eq, csrf_cookie, csrf_validation_middleware,
    generate_csrf_token, get_cookie,
};
pub use path_pattern::PathPattern;
pub use rate_limit::{ClientRateLimiter, client_ip, rate_limit_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security::security_headers;
