use core_config::{ConfigError, FromEnv, env_bool, env_optional, env_or_default, env_parse};
use std::path::PathBuf;

use crate::apply::OpsApplyMode;

pub const DEFAULT_COMPOSE_FILE: &str = "deployment/docker/docker-compose.server.yml";
pub const DEFAULT_SERVICE: &str = "qdrant";

/// Key rotation and ops apply settings.
///
/// - `QDRANT_API_KEY_FILE`: where prepared keys are written
/// - `ENABLE_OPS_APPLY`: allow the server to restart the store (default false)
/// - `OPS_APPLY_MODE`: `docker_compose` or `systemctl`
/// - `OPS_APPLY_COMPOSE_FILE`, `OPS_APPLY_SERVICE`
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub key_file: Option<PathBuf>,
    pub ops_apply_enabled: bool,
    pub ops_apply_mode: OpsApplyMode,
    pub compose_file: PathBuf,
    pub service: String,
}

impl SecurityConfig {
    pub fn apply_command(&self) -> Vec<String> {
        self.ops_apply_mode.command(&self.compose_file, &self.service)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            key_file: None,
            ops_apply_enabled: false,
            ops_apply_mode: OpsApplyMode::default(),
            compose_file: PathBuf::from(DEFAULT_COMPOSE_FILE),
            service: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl FromEnv for SecurityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            key_file: env_optional("QDRANT_API_KEY_FILE").map(PathBuf::from),
            ops_apply_enabled: env_bool("ENABLE_OPS_APPLY", false)?,
            ops_apply_mode: env_parse("OPS_APPLY_MODE", OpsApplyMode::default())?,
            compose_file: PathBuf::from(env_or_default(
                "OPS_APPLY_COMPOSE_FILE",
                DEFAULT_COMPOSE_FILE,
            )),
            service: env_or_default("OPS_APPLY_SERVICE", DEFAULT_SERVICE),
        })
    }
}
