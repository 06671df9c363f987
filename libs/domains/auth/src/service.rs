use axum_helpers::{JwtAuth, constant_time_eq, generate_csrf_token};

use crate::config::AdminConfig;
use crate::error::{AuthError, AuthResult};
use crate::models::TokenResponse;
use crate::password::verify_password;

/// Tokens handed out by a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub response: TokenResponse,
    pub csrf_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    admin: AdminConfig,
    jwt: JwtAuth,
}

impl AuthService {
    pub fn new(admin: AdminConfig, jwt: JwtAuth) -> Self {
        Self { admin, jwt }
    }

    pub fn admin_username(&self) -> &str {
        &self.admin.username
    }

    /// Check `password` against the configured admin hash.
    ///
    /// Used by login and re-used before sensitive operations.
    pub fn verify_admin_password(&self, password: &str) -> AuthResult<()> {
        let hash = self
            .admin
            .password_hash
            .as_deref()
            .ok_or(AuthError::NotConfigured)?;

        if verify_password(password, hash)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Username first, then hash presence, then the password itself.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        if !constant_time_eq(username, &self.admin.username) {
            return Err(AuthError::InvalidCredentials);
        }

        self.verify_admin_password(password)?;

        let access_token = self
            .jwt
            .create_token(username)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        let csrf_token = generate_csrf_token();

        Ok(LoginOutcome {
            response: TokenResponse {
                access_token,
                token_type: "bearer".to_string(),
                csrf_token: csrf_token.clone(),
            },
            csrf_token,
        })
    }
}
