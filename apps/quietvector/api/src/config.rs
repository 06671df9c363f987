use axum_helpers::{ApiKeyConfig, HttpConfig, JwtConfig};
use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig, tracing::TracingConfig};
use domain_auth::AdminConfig;
use domain_security::SecurityConfig;
use domain_vector::QdrantConfig;

pub use core_config::Environment;

/// Routes that skip the CSRF double-submit check.
pub const CSRF_EXEMPT: [&str; 4] = ["/api/auth/login", "/health", "/ready", "/metrics"];

/// Carries its own `SNAPSHOT_UPLOAD_MAX_BYTES` limit.
pub const SNAPSHOT_RESTORE_ROUTE: &str = "/api/snapshots/*/restore";

/// Application-specific configuration
/// Composes shared config components from the core and domain libraries
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub tracing: TracingConfig,
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub api_key: ApiKeyConfig,
    pub admin: AdminConfig,
    pub qdrant: QdrantConfig,
    pub security: SecurityConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        let http = CSRF_EXEMPT
            .into_iter()
            .fold(HttpConfig::from_env()?, |http, path| http.with_csrf_exempt(path))
            .with_body_limit_exempt(SNAPSHOT_RESTORE_ROUTE);

        Ok(Self {
            app: app_info!(),
            environment,
            server: ServerConfig::from_env()?,
            tracing: TracingConfig::from_env()?,
            http,
            jwt: JwtConfig::from_env()?,
            api_key: ApiKeyConfig::from_env()?,
            admin: AdminConfig::from_env()?,
            qdrant: QdrantConfig::from_env()?,
            security: SecurityConfig::from_env()?,
        })
    }

    /// The CSRF cookie is marked `Secure` everywhere but development.
    pub fn secure_cookie(&self) -> bool {
        !self.environment.is_development()
    }
}
