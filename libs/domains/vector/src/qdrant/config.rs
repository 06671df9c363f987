use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse, env_parse_in_range};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SNAPSHOT_UPLOAD_MAX_BYTES: u64 = 1024 * 1024 * 1024;

/// Qdrant REST connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    /// When set, the key is read from this file and reloaded on rotation
    pub api_key_file: Option<PathBuf>,
    pub timeout: Duration,
    pub snapshot_upload_max_bytes: u64,
}

impl QdrantConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.api_key_file = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Port 443 means TLS.
    pub fn use_https(&self) -> bool {
        self.port == 443
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_https() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Key file contents (trimmed) win over `api_key`. An unreadable or
    /// empty file falls back to `api_key`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_file
            .as_ref()
            .and_then(|path| match std::fs::read_to_string(path) {
                Ok(contents) => Some(contents.trim().to_string()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read Qdrant key file");
                    None
                }
            })
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6333,
            api_key: None,
            api_key_file: None,
            timeout: Duration::from_secs(10),
            snapshot_upload_max_bytes: DEFAULT_SNAPSHOT_UPLOAD_MAX_BYTES,
        }
    }
}

impl FromEnv for QdrantConfig {
    /// Reads:
    /// - QDRANT_HOST (localhost), QDRANT_PORT (6333)
    /// - QDRANT_API_KEY, QDRANT_API_KEY_FILE
    /// - QDRANT_TIMEOUT in seconds (10.0, at least 0.1)
    /// - SNAPSHOT_UPLOAD_MAX_BYTES (1 GiB, at least 1024)
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: f64 = env_parse("QDRANT_TIMEOUT", 10.0)?;
        if !timeout_secs.is_finite() || timeout_secs < 0.1 {
            return Err(ConfigError::OutOfRange {
                key: "QDRANT_TIMEOUT".to_string(),
                details: format!("{} is below 0.1", timeout_secs),
            });
        }

        Ok(Self {
            host: env_or_default("QDRANT_HOST", "localhost"),
            port: env_parse_in_range("QDRANT_PORT", 6333, 1..=65535)?,
            api_key: env_optional("QDRANT_API_KEY"),
            api_key_file: env_optional("QDRANT_API_KEY_FILE").map(PathBuf::from),
            timeout: Duration::from_secs_f64(timeout_secs),
            snapshot_upload_max_bytes: env_parse_in_range(
                "SNAPSHOT_UPLOAD_MAX_BYTES",
                DEFAULT_SNAPSHOT_UPLOAD_MAX_BYTES,
                1024..=u64::MAX,
            )?,
        })
    }
}
