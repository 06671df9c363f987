//! Configuration types for axum-helpers.
//!
//! This module provides configuration structs that implement the `FromEnv` trait
//! from `core_config`.

use core_config::{ConfigError, FromEnv, env_optional, env_parse_in_range, env_required};

pub const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 60;

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required) - Must be at least 32 characters for security
/// - `TOKEN_EXPIRE_MINUTES` (default 60) - Access token lifetime, 5..=1440
///
/// # Example
///
/// ```ignore
/// use axum_helpers::JwtConfig;
/// use core_config::FromEnv;
///
/// // From environment variables
/// let config = JwtConfig::from_env()?;
///
/// // Manual construction (for testing)
/// let config = JwtConfig::new("my-super-secret-key-that-is-at-least-32-chars");
/// ```
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// JWT signing secret (minimum 32 characters)
    pub secret: String,
    /// Access token lifetime in minutes
    pub expire_minutes: i64,
}

impl JwtConfig {
    /// Create a new JwtConfig with the given secret and the default lifetime.
    ///
    /// # Panics
    /// Panics if the secret is less than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= 32,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
        }
    }

    pub fn with_expire_minutes(mut self, minutes: i64) -> Self {
        self.expire_minutes = minutes;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < 32 {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters for security (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        let expire_minutes = env_parse_in_range(
            "TOKEN_EXPIRE_MINUTES",
            DEFAULT_TOKEN_EXPIRE_MINUTES,
            5..=24 * 60,
        )?;

        Ok(Self {
            secret,
            expire_minutes,
        })
    }
}

/// Optional shared API key demanded on every protected request.
///
/// - `REQUIRE_API_KEY` (default false)
/// - `API_KEY` (required when the flag is on)
#[derive(Clone, Debug, Default)]
pub struct ApiKeyConfig {
    pub required_key: Option<String>,
}

impl FromEnv for ApiKeyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        if !core_config::env_bool("REQUIRE_API_KEY", false)? {
            return Ok(Self::default());
        }

        let key = env_optional("API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("API_KEY".to_string()))?;
        Ok(Self {
            required_key: Some(key),
        })
    }
}
