use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Creates a CORS layer for the configured frontend origins.
///
/// Returns `None` when no origin parses, so the caller can skip the layer.
///
/// The layer allows:
/// - GET, POST, DELETE, OPTIONS
/// - Content-Type, Authorization, Accept, x-csrf-token, x-api-key
/// - Credentials (the CSRF cookie must travel)
/// - 1 hour max age
pub fn create_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                HeaderName::from_static("x-csrf-token"),
                HeaderName::from_static("x-api-key"),
            ])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_origins_no_layer() {
        assert!(create_cors_layer(&[]).is_none());
    }

    #[test]
    fn test_valid_origin_builds_layer() {
        assert!(create_cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
