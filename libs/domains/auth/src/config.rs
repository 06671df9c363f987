use core_config::{ConfigError, FromEnv, env_optional, env_or_default};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// The operator account.
///
/// - `ADMIN_USERNAME`: defaults to `admin`, at least 3 characters
/// - `ADMIN_PASSWORD_HASH`: argon2 PHC string; login fails with 500 while unset
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    pub password_hash: Option<String>,
}

impl AdminConfig {
    pub fn new(username: impl Into<String>, password_hash: Option<String>) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }
}

impl FromEnv for AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = env_or_default("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME);
        if username.chars().count() < 3 {
            return Err(ConfigError::ParseError {
                key: "ADMIN_USERNAME".to_string(),
                details: "must be at least 3 characters".to_string(),
            });
        }

        Ok(Self {
            username,
            password_hash: env_optional("ADMIN_PASSWORD_HASH"),
        })
    }
}
