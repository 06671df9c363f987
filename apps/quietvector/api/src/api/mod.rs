//! API routes module
//!
//! Everything under `/api` except login sits behind [`require_auth`].

pub mod health;

use axum::{Router, middleware};
use axum_helpers::{create_router, health_router, require_auth};
use domain_auth::auth_router;
use domain_security::security_router;
use domain_vector::{snapshot_router, vector_router};
use observability::metrics_middleware;
use std::io;

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> io::Result<Router> {
    let upload_limit = usize::try_from(state.config.qdrant.snapshot_upload_max_bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let protected = Router::new()
        .merge(vector_router(state.vectors.clone()))
        .merge(snapshot_router(state.snapshots.clone(), upload_limit))
        .nest("/security", security_router(state.security.clone()))
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_auth,
        ));

    Ok(Router::new()
        .nest("/auth", auth_router(state.auth.clone()))
        .merge(protected))
}

/// The full application: documented API behind the HTTP pipeline, plus
/// liveness, readiness and metrics.
pub async fn app(state: &AppState) -> io::Result<Router> {
    let router = create_router::<ApiDoc>(routes(state)?, &state.config.http).await?;

    Ok(router
        .merge(health_router(state.config.app))
        .merge(health::router(state.qdrant.clone()))
        .layer(middleware::from_fn(metrics_middleware)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CSRF_EXEMPT, Config, Environment, SNAPSHOT_RESTORE_ROUTE};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use axum_helpers::{ApiKeyConfig, HttpConfig, JwtConfig};
    use core_config::{app_info, server::ServerConfig, tracing::TracingConfig};
    use domain_auth::{AdminConfig, hash_password};
    use domain_security::SecurityConfig;
    use domain_vector::QdrantConfig;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct TestApp {
        router: Router,
        qdrant: MockServer,
        _audit_dir: tempfile::TempDir,
    }

    async fn test_app(api_key: Option<&str>) -> TestApp {
        let qdrant = MockServer::start().await;
        let address = qdrant.address();
        let audit_dir = tempfile::tempdir().unwrap();

        let http = CSRF_EXEMPT
            .into_iter()
            .fold(
                HttpConfig {
                    audit_log_path: audit_dir.path().join("audit.log"),
                    ..Default::default()
                },
                |http, path| http.with_csrf_exempt(path),
            )
            .with_body_limit_exempt(SNAPSHOT_RESTORE_ROUTE);

        let config = Config {
            app: app_info!(),
            environment: Environment::Development,
            server: ServerConfig::new("127.0.0.1".to_string(), 0),
            tracing: TracingConfig::new(Environment::Development, false),
            http,
            jwt: JwtConfig::new("test-secret-key-at-least-32-chars-long!!"),
            api_key: ApiKeyConfig {
                required_key: api_key.map(str::to_string),
            },
            admin: AdminConfig::new("admin", Some(hash_password("admin-pass").unwrap())),
            qdrant: QdrantConfig::new(address.ip().to_string(), address.port()),
            security: SecurityConfig::default(),
        };

        let state = AppState::new(config).unwrap();
        TestApp {
            router: app(&state).await.unwrap(),
            qdrant,
            _audit_dir: audit_dir,
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(router: &Router) -> (String, String) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"username": "admin", "password": "admin-pass"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["csrf_token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app(None).await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["name"], "quietvector_api");
    }

    #[tokio::test]
    async fn test_ready_reflects_qdrant() {
        let app = test_app(None).await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("healthz check passed"))
            .mount(&app.qdrant)
            .await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "ready", "qdrant": "connected"})
        );
    }

    #[tokio::test]
    async fn test_ready_is_503_when_qdrant_fails() {
        let app = test_app(None).await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&app.qdrant)
            .await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_collections_require_token() {
        let app = test_app(None).await;

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/collections")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Missing token");
    }

    #[tokio::test]
    async fn test_login_then_list_collections() {
        let app = test_app(None).await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"collections": []},
                "status": "ok"
            })))
            .mount(&app.qdrant)
            .await;

        let (token, _) = login(&app.router).await;
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/collections")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"collections": []}));
    }

    #[tokio::test]
    async fn test_post_without_csrf_is_403() {
        let app = test_app(None).await;
        let (token, _) = login(&app.router).await;

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/collections")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"name": "docs", "vectors_size": 4}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "CSRF_MISSING");
    }

    #[tokio::test]
    async fn test_post_with_csrf_creates_collection() {
        let app = test_app(None).await;
        Mock::given(method("PUT"))
            .and(path("/collections/docs"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": true, "status": "ok"})),
            )
            .mount(&app.qdrant)
            .await;

        let (token, csrf) = login(&app.router).await;
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/collections")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-csrf-token", &csrf)
                    .header(header::COOKIE, format!("csrf_token={csrf}"))
                    .body(Body::from(json!({"name": "docs", "vectors_size": 4}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_api_key_checked_before_token() {
        let app = test_app(Some("shared-key")).await;
        let (token, _) = login(&app.router).await;

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/stats")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app(None).await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = test_app(None).await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
