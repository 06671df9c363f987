//! CSRF protection using the double submit cookie pattern.
//!
//! Login issues a random token twice: in the JSON body and as an HttpOnly
//! `csrf_token` cookie. State-changing requests must echo it in the
//! `X-CSRF-Token` header; the middleware compares header and cookie.

use super::PathPattern;
use crate::errors::{ErrorCode, error_response};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "csrf_token";

/// Paths that skip the check regardless of method.
#[derive(Clone, Debug, Default)]
pub struct CsrfConfig {
    exempt: Arc<Vec<PathPattern>>,
}

impl CsrfConfig {
    pub fn new(exempt: Vec<PathPattern>) -> Self {
        Self {
            exempt: Arc::new(exempt),
        }
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|p| p.matches(path))
    }
}

/// 64 hex characters from two random v4 UUIDs.
pub fn generate_csrf_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// `Set-Cookie` value for the CSRF token. `Secure` is omitted when `secure` is false.
pub fn csrf_cookie(token: &str, secure: bool) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!("{CSRF_COOKIE}={token}; HttpOnly;{secure} SameSite=Strict; Path=/")
}

/// Read one cookie value from the `Cookie` headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
}

/// Compare two secrets without leaking where they differ.
///
/// Both sides are hashed first so the comparison length is fixed.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware for CSRF token validation.
///
/// Skips GET/HEAD/OPTIONS and exempt paths. Otherwise both the header and
/// the cookie must be present (403 `CSRF_MISSING`) and equal (403 `CSRF_INVALID`).
pub async fn csrf_validation_middleware(
    State(config): State<CsrfConfig>,
    request: Request,
    next: Next,
) -> Response {
    if matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) || config.is_exempt(request.uri().path())
    {
        return next.run(request).await;
    }

    let headers = request.headers();
    let header_token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let cookie_token = get_cookie(headers, CSRF_COOKIE).filter(|v| !v.is_empty());

    let (Some(header_token), Some(cookie_token)) = (header_token.as_deref(), cookie_token.as_deref())
    else {
        tracing::warn!(
            path = %request.uri().path(),
            method = %request.method(),
            has_header = header_token.is_some(),
            has_cookie = cookie_token.is_some(),
            "CSRF validation failed: missing token"
        );
        return error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::CsrfMissing.default_message().to_string(),
            ErrorCode::CsrfMissing,
        );
    };

    if !constant_time_eq(header_token, cookie_token) {
        tracing::warn!(
            path = %request.uri().path(),
            method = %request.method(),
            "CSRF validation failed: token mismatch"
        );
        return error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::CsrfInvalid.default_message().to_string(),
            ErrorCode::CsrfInvalid,
        );
    }

    next.run(request).await
}
