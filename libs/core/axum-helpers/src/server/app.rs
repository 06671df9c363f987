use super::shutdown::{ShutdownCoordinator, coordinated_shutdown};
use crate::audit::{AuditLog, audit_log_middleware};
use crate::errors::{
    ErrorCode, error_response,
    handlers::{method_not_allowed, not_found},
};
use crate::http::{
    BodyLimit, ClientRateLimiter, CsrfConfig, HttpConfig, body_limit_middleware,
    create_cors_layer, csrf_validation_middleware, rate_limit::CLEANUP_INTERVAL,
    rate_limit_middleware, request_id_middleware, security_headers,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Response,
};
use core_config::server::ServerConfig;
use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Turns a handler panic into a 500 `INTERNAL_ERROR` body.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %details, "Handler panicked");

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalError.default_message().to_string(),
        ErrorCode::InternalError,
    )
}

/// Creates the application router with documentation and the request pipeline.
///
/// This function sets up:
/// - OpenAPI documentation (Swagger UI, ReDoc, RapiDoc, Scalar)
/// - API routes nested under `/api`
/// - JSON 404 and 405 fallbacks
///
/// Layers, outermost first:
/// 1. compression, CORS (only when origins are configured)
/// 2. `DefaultBodyLimit` at `max_body_size_bytes` (routes may override)
/// 3. security headers, request tracing span
/// 4. request id, declared body size, rate limit, CSRF, audit log
/// 5. panic catcher, so panics still reach the audit log as 500s
///
/// Routes that must bypass CSRF or the body size check are listed in
/// `config.csrf_exempt` and `config.body_limit_exempt`. Health and docs
/// routes merged afterwards are outside this pipeline.
///
/// The rate limiter's cleanup task is spawned here, so this must run
/// inside a tokio runtime.
///
/// # Example
/// ```ignore
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new()
///     .route("/example", get(handler))
///     .with_state(my_state);
///
/// let router = create_router::<ApiDoc>(api_routes, &HttpConfig::from_env()?).await?;
/// ```
pub async fn create_router<T>(apis: Router, config: &HttpConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    let body_limit = usize::try_from(config.max_body_size_bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let limiter = ClientRateLimiter::per_minute(config.rate_limit_per_minute);
    limiter.spawn_cleanup(CLEANUP_INTERVAL);

    let audit_log = AuditLog::new(config.audit_log_path.clone());
    info!(
        path = %audit_log.path().display(),
        rate_limit_per_minute = config.rate_limit_per_minute,
        max_body_size_bytes = config.max_body_size_bytes,
        "HTTP pipeline configured"
    );

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(audit_log, audit_log_middleware))
        .layer(middleware::from_fn_with_state(
            CsrfConfig::new(config.csrf_exempt.clone()),
            csrf_validation_middleware,
        ))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(middleware::from_fn_with_state(
            BodyLimit::new(config.max_body_size_bytes, config.body_limit_exempt.clone()),
            body_limit_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(DefaultBodyLimit::max(body_limit));

    match create_cors_layer(&config.frontend_origins) {
        Some(cors) => {
            info!(origins = ?config.frontend_origins, "CORS enabled");
            router = router.layer(cors);
        }
        None => info!("CORS disabled: FRONTEND_ORIGIN not set"),
    }

    // gzip, br, deflate, zstd per Accept-Encoding
    Ok(router.layer(CompressionLayer::new()))
}

/// Production server with coordinated shutdown and cleanup.
///
/// Serves with `ConnectInfo<SocketAddr>` so middleware can see the peer
/// address. On SIGINT/SIGTERM, in-flight requests drain and `cleanup` runs
/// under `shutdown_timeout`.
///
/// # Example
/// ```ignore
/// create_production_app(router, &config, Duration::from_secs(30), async {
///     info!("Nothing to flush");
/// })
/// .await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let mut shutdown_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        if shutdown_rx.recv().await.is_err() {
            return;
        }

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(coordinated_shutdown(coordinator.clone()))
    .await
    .inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    });

    // Make sure the cleanup task is released even if serve failed early.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
