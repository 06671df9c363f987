//! Type-safe error codes for API responses.
//!
//! This module provides a single source of truth for error codes used across
//! the application. Each error code includes:
//! - String representation for client consumption (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
///
/// Combines string identifiers (for clients), integer codes (for monitoring),
/// and default messages (for consistency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// An unexpected internal server error occurred
    InternalError,

    /// Authentication credentials are missing or invalid
    Unauthorized,

    /// Authenticated caller lacks sufficient permissions
    Forbidden,

    /// Request is malformed or rejected by the upstream store
    BadRequest,

    /// Declared request body exceeds the configured limit
    PayloadTooLarge,

    /// Client exceeded its request budget
    RateLimited,

    /// CSRF header or cookie absent on a state-changing request
    CsrfMissing,

    /// CSRF header and cookie do not match
    CsrfInvalid,

    /// HTTP method not supported on this route
    MethodNotAllowed,

    // Upstream errors (2000-2999)
    /// Vector store answered with an unexpected status
    UpstreamError,

    /// Vector store could not be reached
    UpstreamUnavailable,

    // I/O errors (4000s)
    /// File system I/O error
    IoError,

    // JSON parsing errors (5000s)
    /// JSON serialization/deserialization error
    SerdeJsonError,
}

impl ErrorCode {
    /// Get the string representation for client consumption.
    ///
    /// ```rust
    /// use axum_helpers::errors::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::CsrfMissing.as_str(), "CSRF_MISSING");
    /// assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::RateLimited => "RATE_LIMITED",
            Self::CsrfMissing => "CSRF_MISSING",
            Self::CsrfInvalid => "CSRF_INVALID",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Get the integer code for logging and monitoring.
    ///
    /// Ranges:
    /// - 1000-1999: Client errors
    /// - 2000-2999: Upstream (vector store) errors
    /// - 4000-4999: I/O errors
    /// - 5000-5999: Serialization errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::BadRequest => 1012,
            Self::PayloadTooLarge => 1013,
            Self::RateLimited => 1014,
            Self::CsrfMissing => 1015,
            Self::CsrfInvalid => 1016,
            Self::MethodNotAllowed => 1017,

            Self::UpstreamError => 2001,
            Self::UpstreamUnavailable => 2002,

            Self::IoError => 4001,

            Self::SerdeJsonError => 5001,
        }
    }

    /// Get the default user-facing error message.
    ///
    /// Individual handlers can override these messages with more specific details.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::InternalError => "Internal server error",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::BadRequest => "Bad request",
            Self::PayloadTooLarge => "Request body too large",
            Self::RateLimited => "Rate limit exceeded",
            Self::CsrfMissing => "CSRF token missing",
            Self::CsrfInvalid => "CSRF token invalid",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::UpstreamError => "Vector store returned an error",
            Self::UpstreamUnavailable => "Vector store is unreachable",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "JSON serialization error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
