pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Standard error response structure.
///
/// Every error leaving the API has this shape:
/// - `code`: Integer error code for logging/monitoring (e.g., 1015)
/// - `error`: Machine-readable error identifier (e.g., "CSRF_MISSING")
/// - `message`: Human-readable error message
/// - `details`: Optional additional error details (e.g., validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1006,
///   "error": "UNAUTHORIZED",
///   "message": "Invalid credentials"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details, code) = match self {
            AppError::SerdeJson(e) => {
                tracing::error!(
                    error_code = ErrorCode::SerdeJsonError.code(),
                    "JSON parsing error: {:?}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::SerdeJsonError.default_message().to_string(),
                    None,
                    ErrorCode::SerdeJsonError,
                )
            }
            AppError::Io(e) => {
                tracing::error!(error_code = ErrorCode::IoError.code(), "I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::IoError.default_message().to_string(),
                    None,
                    ErrorCode::IoError,
                )
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (e.status(), e.body_text(), None, ErrorCode::JsonExtraction)
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorCode::ValidationError.default_message().to_string(),
                    Some(validation_details(&e)),
                    ErrorCode::ValidationError,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::BadRequest)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, msg, None, ErrorCode::Unauthorized)
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg, None, ErrorCode::Forbidden)
            }
            AppError::NotFound(msg) => {
                tracing::info!(
                    error_code = ErrorCode::NotFound.code(),
                    "Not found: {}",
                    msg
                );
                (StatusCode::NOT_FOUND, msg, None, ErrorCode::NotFound)
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::info!("Payload too large: {}", msg);
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    msg,
                    None,
                    ErrorCode::PayloadTooLarge,
                )
            }
            AppError::TooManyRequests(msg) => {
                tracing::info!("Too many requests: {}", msg);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    msg,
                    None,
                    ErrorCode::RateLimited,
                )
            }
            AppError::BadGateway(msg) => {
                tracing::warn!(
                    error_code = ErrorCode::UpstreamError.code(),
                    "Bad gateway: {}",
                    msg
                );
                (StatusCode::BAD_GATEWAY, msg, None, ErrorCode::UpstreamError)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    msg,
                    None,
                    ErrorCode::InternalError,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code.code(),
            error: code.as_str().to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Flatten validator errors into `{field: [{code, message, params}]}`.
///
/// Nested structs and lists are keyed by path (`points[1].vector`);
/// struct-level checks appear under `__all__`.
pub fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let mut details = serde_json::Map::new();
    flatten_validation_errors(errors, None, &mut details);
    serde_json::Value::Object(details)
}

fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut serde_json::Map<String, serde_json::Value>,
) {
    for (field, kind) in errors.errors() {
        let key = match prefix {
            Some(p) if field == "__all__" => p.to_string(),
            Some(p) => format!("{p}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let entries: Vec<serde_json::Value> = errs
                    .iter()
                    .map(|err| {
                        serde_json::json!({
                            "code": err.code,
                            "message": err.message,
                            "params": err.params,
                        })
                    })
                    .collect();
                out.insert(key, serde_json::json!(entries));
            }
            ValidationErrorsKind::Struct(inner) => {
                flatten_validation_errors(inner, Some(&key), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(inner, Some(&format!("{key}[{index}]")), out);
                }
            }
        }
    }
}

/// Helper function to create error responses outside of `AppError`,
/// used by middleware that rejects before a handler runs.
///
/// # Example
///
/// ```rust,ignore
/// use axum_helpers::errors::{error_response, ErrorCode};
/// use axum::http::StatusCode;
///
/// let response = error_response(
///     StatusCode::FORBIDDEN,
///     ErrorCode::CsrfMissing.default_message().to_string(),
///     ErrorCode::CsrfMissing,
/// );
/// ```
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        details: None,
    });

    (status, body).into_response()
}
