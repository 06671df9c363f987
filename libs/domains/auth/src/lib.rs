//! Single-administrator authentication.
//!
//! One operator account is configured through the environment
//! (`ADMIN_USERNAME`, `ADMIN_PASSWORD_HASH`). Logging in verifies the argon2
//! hash, issues a bearer token and a CSRF double-submit token.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod service;

pub use config::AdminConfig;
pub use error::{AuthError, AuthResult};
pub use handlers::{AuthApiDoc, AuthState, auth_router};
pub use models::{LoginRequest, TokenResponse};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, LoginOutcome};
