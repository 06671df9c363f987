use super::PathPattern;
use crate::errors::{ErrorCode, error_response};
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Declared body size ceiling with per-route exemptions.
#[derive(Clone, Debug)]
pub struct BodyLimit {
    pub max_bytes: u64,
    exempt: Arc<Vec<PathPattern>>,
}

impl BodyLimit {
    pub fn new(max_bytes: u64, exempt: Vec<PathPattern>) -> Self {
        Self {
            max_bytes,
            exempt: Arc::new(exempt),
        }
    }
}

/// Rejects requests whose `Content-Length` exceeds the limit with 413.
///
/// Only the declared length is checked here; streamed bodies are capped by
/// axum's `DefaultBodyLimit` on extraction.
pub async fn body_limit_middleware(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if limit.exempt.iter().any(|p| p.matches(path)) {
        return next.run(request).await;
    }

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(len) = declared.filter(|len| *len > limit.max_bytes) {
        tracing::info!(
            path = %path,
            content_length = len,
            max = limit.max_bytes,
            "Request body too large"
        );
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::PayloadTooLarge.default_message().to_string(),
            ErrorCode::PayloadTooLarge,
        );
    }

    next.run(request).await
}
