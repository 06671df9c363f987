use super::jwt::{JwtAuth, JwtClaims};
use crate::errors::AppError;
use crate::http::csrf::constant_time_eq;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

/// Header carrying the shared API key when one is required.
pub const API_KEY_HEADER: &str = "x-api-key";

/// State for [`require_auth`].
#[derive(Clone)]
pub struct AuthGuard {
    pub jwt: JwtAuth,
    pub api_key: Option<String>,
}

impl AuthGuard {
    pub fn new(jwt: JwtAuth) -> Self {
        Self { jwt, api_key: None }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Extract the bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication guard for protected routes.
///
/// Checks the shared API key first (when configured), then the bearer token.
/// Inserts [`JwtClaims`] into request extensions on success.
///
/// # Example
///
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/api/collections", get(list_collections))
///     .layer(axum::middleware::from_fn_with_state(guard.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(guard): State<AuthGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = guard.api_key.as_deref() {
        let presented = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !constant_time_eq(presented, expected) {
            tracing::debug!("API key missing or mismatched");
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }
    }

    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("No bearer token in Authorization header");
        return Err(AppError::Unauthorized("Missing token".to_string()));
    };

    let claims = guard.jwt.verify_token(token).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Claims of the authenticated caller, placed by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthClaims(pub JwtClaims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .map(AuthClaims)
            .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))
    }
}
