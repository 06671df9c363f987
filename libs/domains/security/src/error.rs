use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_auth::AuthError;
use thiserror::Error;

use crate::ops::OpNotFound;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("QDRANT_API_KEY_FILE not configured on server")]
    KeyFileNotConfigured,

    #[error("Failed to write key file: {0}")]
    KeyFileWrite(std::io::Error),

    #[error("Ops apply is disabled on this server")]
    OpsApplyDisabled,

    #[error("Failed to run command: {0}")]
    Command(std::io::Error),

    #[error(transparent)]
    OpNotFound(#[from] OpNotFound),
}

pub type SecurityResult<T> = Result<T, SecurityError>;

impl From<SecurityError> for AppError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::Auth(e) => e.into(),
            SecurityError::KeyFileNotConfigured => AppError::BadRequest(err.to_string()),
            SecurityError::KeyFileWrite(_) | SecurityError::Command(_) => {
                AppError::InternalServerError(err.to_string())
            }
            SecurityError::OpsApplyDisabled => AppError::Forbidden(err.to_string()),
            SecurityError::OpNotFound(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
