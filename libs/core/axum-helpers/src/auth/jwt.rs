use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Issuer stamped into and required on every access token.
pub const TOKEN_ISSUER: &str = "quietvector";

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // Subject (admin username)
    pub iat: i64,    // Issued at
    pub nbf: i64,    // Not before
    pub exp: i64,    // Expiration time
    pub iss: String, // Issuer
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Stateless HS256 access tokens.
///
/// Cheap to clone; keys are built once and shared.
#[derive(Clone)]
pub struct JwtAuth {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl JwtAuth {
    /// Create a new token service.
    ///
    /// # Example
    /// ```ignore
    /// use axum_helpers::{JwtAuth, JwtConfig};
    /// use core_config::FromEnv;
    ///
    /// let jwt = JwtAuth::new(&JwtConfig::from_env()?);
    /// let token = jwt.create_token("admin")?;
    /// ```
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
        validation.validate_nbf = true;

        let keys = Keys {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        };

        tracing::info!(expire_minutes = config.expire_minutes, "JWT auth initialized");
        Self {
            keys: Arc::new(keys),
            ttl: Duration::minutes(config.expire_minutes),
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Create a signed access token for `subject`.
    pub fn create_token(&self, subject: &str) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.encoding,
        )?;

        Ok(token)
    }

    /// Verify signature, expiry and issuer, then decode claims.
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let data = decode::<JwtClaims>(token, &self.keys.decoding, &self.keys.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-key-that-is-at-least-32-chars"))
    }

    #[test]
    fn test_create_and_verify_token() {
        let jwt = auth();
        let token = jwt.create_token("admin").unwrap();
        let claims = jwt.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.nbf, claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-key-that-is-32-chars-long"));
        let token = other.create_token("admin").unwrap();
        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtAuth::new(
            &JwtConfig::new("test-secret-key-that-is-at-least-32-chars").with_expire_minutes(-10),
        );
        let token = jwt.create_token("admin").unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let secret = "test-secret-key-that-is-at-least-32-chars";
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: "admin".into(),
            iat: now,
            nbf: now,
            exp: now + 600,
            iss: "someone-else".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(auth().verify_token("not-a-jwt").is_err());
    }
}
