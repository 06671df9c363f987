use super::PathPattern;
use core_config::{
    ConfigError, FromEnv, env_optional, env_or_default, env_parse_in_range,
};
use std::path::PathBuf;

pub const DEFAULT_MAX_BODY_SIZE_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;
pub const DEFAULT_AUDIT_LOG_PATH: &str = "/var/log/quietvector/audit.log";

/// Settings for the request pipeline built by `create_router`.
///
/// Loaded from environment variables:
/// - `FRONTEND_ORIGIN` - comma-separated CORS origins (CORS disabled when unset)
/// - `MAX_BODY_SIZE_BYTES` (default 1 MiB, 1024..=10485760)
/// - `RATE_LIMIT_PER_MINUTE` (default 60, 1..=10000)
/// - `AUDIT_LOG_PATH` (default `/var/log/quietvector/audit.log`)
///
/// Exempt paths are not configurable from the environment; the binary adds
/// them with the builder methods.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub frontend_origins: Vec<String>,
    pub max_body_size_bytes: u64,
    pub rate_limit_per_minute: u32,
    pub audit_log_path: PathBuf,
    pub body_limit_exempt: Vec<PathPattern>,
    pub csrf_exempt: Vec<PathPattern>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            frontend_origins: Vec::new(),
            max_body_size_bytes: DEFAULT_MAX_BODY_SIZE_BYTES,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            body_limit_exempt: Vec::new(),
            csrf_exempt: Vec::new(),
        }
    }
}

impl HttpConfig {
    pub fn with_body_limit_exempt(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.body_limit_exempt.push(pattern.into());
        self
    }

    pub fn with_csrf_exempt(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.csrf_exempt.push(pattern.into());
        self
    }
}

impl FromEnv for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let frontend_origins = env_optional("FRONTEND_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            frontend_origins,
            max_body_size_bytes: env_parse_in_range(
                "MAX_BODY_SIZE_BYTES",
                DEFAULT_MAX_BODY_SIZE_BYTES,
                1024..=10 * 1024 * 1024,
            )?,
            rate_limit_per_minute: env_parse_in_range(
                "RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
                1..=10_000,
            )?,
            audit_log_path: PathBuf::from(env_or_default("AUDIT_LOG_PATH", DEFAULT_AUDIT_LOG_PATH)),
            body_limit_exempt: Vec::new(),
            csrf_exempt: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("FRONTEND_ORIGIN", None::<&str>),
                ("MAX_BODY_SIZE_BYTES", None),
                ("RATE_LIMIT_PER_MINUTE", None),
                ("AUDIT_LOG_PATH", None),
            ],
            || {
                let config = HttpConfig::from_env().unwrap();
                assert!(config.frontend_origins.is_empty());
                assert_eq!(config.max_body_size_bytes, 1_048_576);
                assert_eq!(config.rate_limit_per_minute, 60);
                assert_eq!(config.audit_log_path, PathBuf::from(DEFAULT_AUDIT_LOG_PATH));
            },
        );
    }

    #[test]
    fn test_frontend_origins_split() {
        temp_env::with_var(
            "FRONTEND_ORIGIN",
            Some("http://localhost:5173, https://admin.example.com,"),
            || {
                let config = HttpConfig::from_env().unwrap();
                assert_eq!(
                    config.frontend_origins,
                    vec!["http://localhost:5173", "https://admin.example.com"]
                );
            },
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        temp_env::with_var("MAX_BODY_SIZE_BYTES", Some("100"), || {
            assert!(HttpConfig::from_env().is_err());
        });
        temp_env::with_var("RATE_LIMIT_PER_MINUTE", Some("0"), || {
            assert!(HttpConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_builders() {
        let config = HttpConfig::default()
            .with_csrf_exempt("/health")
            .with_body_limit_exempt("/api/snapshots/*/restore");
        assert!(config.csrf_exempt[0].matches("/health"));
        assert!(config.body_limit_exempt[0].matches("/api/snapshots/a/restore"));
    }
}
