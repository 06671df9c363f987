use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::post,
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, ValidatedJson, csrf_cookie,
    audit::{extract_ip_from_headers, extract_user_agent},
    errors::responses::{
        InternalServerErrorResponse, UnauthorizedResponse, ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::AuthError;
use crate::models::{LoginRequest, TokenResponse};
use crate::service::AuthService;

#[derive(OpenApi)]
#[openapi(
    paths(login),
    components(
        schemas(LoginRequest, TokenResponse),
        responses(UnauthorizedResponse, ValidationErrorResponse, InternalServerErrorResponse)
    ),
    tags((name = "auth", description = "Administrator login"))
)]
pub struct AuthApiDoc;

#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
    /// Adds `Secure` to the CSRF cookie; off in development
    pub secure_cookie: bool,
}

/// Log in as the administrator
///
/// Returns a bearer token plus a CSRF token, and sets the matching
/// `csrf_token` cookie.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse,
            headers(("set-cookie" = String, description = "csrf_token cookie"))),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.service.login(&request.username, &request.password);

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(AuthError::InvalidCredentials) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    };
    AuditEvent::new(Some(request.username.clone()), "auth.login", None, outcome)
        .with_ip(extract_ip_from_headers(&headers))
        .with_user_agent(extract_user_agent(&headers))
        .log();

    let login = result?;
    let cookie = csrf_cookie(&login.csrf_token, state.secure_cookie);

    Ok(([(header::SET_COOKIE, cookie)], Json(login.response)))
}

pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::password::hash_password;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use axum_helpers::{ErrorResponse, JwtAuth, JwtConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(hash: Option<String>, secure_cookie: bool) -> Router {
        let jwt = JwtAuth::new(&JwtConfig::new("test-secret-key-at-least-32-chars-long!!"));
        let service = AuthService::new(AdminConfig::new("admin", hash), jwt);
        auth_router(AuthState {
            service: Arc::new(service),
            secure_cookie,
        })
    }

    fn login_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_csrf_cookie() {
        let app = app(Some(hash_password("hunter22").unwrap()), true);
        let response = app
            .oneshot(login_request(r#"{"username":"admin","password":"hunter22"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let tokens: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(tokens.token_type, "bearer");
        assert_eq!(
            cookie,
            format!(
                "csrf_token={}; HttpOnly; Secure; SameSite=Strict; Path=/",
                tokens.csrf_token
            )
        );
    }

    #[tokio::test]
    async fn test_login_cookie_not_secure_in_development() {
        let app = app(Some(hash_password("hunter22").unwrap()), false);
        let response = app
            .oneshot(login_request(r#"{"username":"admin","password":"hunter22"}"#))
            .await
            .unwrap();

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(!cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let app = app(Some(hash_password("hunter22").unwrap()), true);
        let response = app
            .oneshot(login_request(r#"{"username":"admin","password":"nope-nope"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.message, "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_not_configured() {
        let app = app(None, true);
        let response = app
            .oneshot(login_request(r#"{"username":"admin","password":"hunter22"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.message, "Admin password not configured");
    }

    #[tokio::test]
    async fn test_login_short_fields_rejected() {
        let app = app(None, true);
        let response = app
            .oneshot(login_request(r#"{"username":"ad","password":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
