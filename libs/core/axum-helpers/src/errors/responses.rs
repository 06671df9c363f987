//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "message": "Internal server error"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unprocessable Entity - Validation Error",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "details": {
            "limit": [{
                "code": "range",
                "message": null,
                "params": {"min": 1, "max": 100, "value": 500}
            }]
        }
    })
)]
pub struct ValidationErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request",
    content_type = "application/json",
    example = json!({
        "code": 1012,
        "error": "BAD_REQUEST",
        "message": "Dimension mismatch"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 1004,
        "error": "NOT_FOUND",
        "message": "Collection not found: docs"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unauthorized - Authentication required",
    content_type = "application/json",
    example = json!({
        "code": 1006,
        "error": "UNAUTHORIZED",
        "message": "Missing token"
    })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Forbidden - CSRF check failed or feature disabled",
    content_type = "application/json",
    example = json!({
        "code": 1015,
        "error": "CSRF_MISSING",
        "message": "CSRF token missing"
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Payload Too Large",
    content_type = "application/json",
    example = json!({
        "code": 1013,
        "error": "PAYLOAD_TOO_LARGE",
        "message": "Request body too large"
    })
)]
pub struct PayloadTooLargeResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Too Many Requests",
    content_type = "application/json",
    example = json!({
        "code": 1014,
        "error": "RATE_LIMITED",
        "message": "Rate limit exceeded"
    })
)]
pub struct TooManyRequestsResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Gateway - vector store error",
    content_type = "application/json",
    example = json!({
        "code": 2001,
        "error": "UPSTREAM_ERROR",
        "message": "Qdrant returned 500 Internal Server Error"
    })
)]
pub struct BadGatewayResponse(pub ErrorResponse);
