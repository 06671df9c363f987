use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin password not configured")]
    NotConfigured,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Failed to issue token: {0}")]
    Token(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            AuthError::NotConfigured => AppError::InternalServerError(err.to_string()),
            AuthError::PasswordHash(msg) => {
                // A malformed stored hash is a server fault; never echo it.
                tracing::error!("Stored admin hash is unusable: {}", msg);
                AppError::InternalServerError("Admin password not configured".to_string())
            }
            AuthError::Token(msg) => {
                tracing::error!("Token issuance failed: {}", msg);
                AppError::InternalServerError("Failed to create token".to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
