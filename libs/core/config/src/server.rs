use crate::{env_or_default, env_parse_in_range, ConfigError, FromEnv};
use std::net::Ipv4Addr;

pub const DEFAULT_PORT: u16 = 8090;

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables:
    /// - API_HOST: defaults to loopback (127.0.0.1)
    /// - API_PORT: defaults to 8090, must be unprivileged (1024..=65535)
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("API_HOST", &Ipv4Addr::LOCALHOST.to_string());
        let port = env_parse_in_range("API_PORT", DEFAULT_PORT, 1024..=65535)?;

        Ok(Self { host, port })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::LOCALHOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
