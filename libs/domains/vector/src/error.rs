use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Failed to create collection: {0}")]
    CreateFailed(String),

    /// Qdrant rejected a collection or point operation
    #[error("{0}")]
    Qdrant(String),

    /// Non-success answer on a proxied snapshot call
    #[error("Qdrant returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Qdrant unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert VectorError to AppError for standardized HTTP error responses
impl From<VectorError> for AppError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::CollectionNotFound(_) => AppError::NotFound(err.to_string()),
            VectorError::CreateFailed(_) | VectorError::Qdrant(_) | VectorError::Validation(_) => {
                AppError::BadRequest(err.to_string())
            }
            VectorError::Upstream { .. } | VectorError::Unreachable(_) => {
                AppError::BadGateway(err.to_string())
            }
            VectorError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for VectorError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
