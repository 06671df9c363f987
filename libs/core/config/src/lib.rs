pub mod server;
pub mod tracing;

use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Environment variable '{key}' is out of range: {details}")]
    OutOfRange { key: String, details: String },
}

/// Application environment.
///
/// Unset means `staging`, which behaves like production for cookies and TLS
/// but keeps its own name in logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "staging".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else if app_env.eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Staging
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    // Secure cookies everywhere except local development
    pub fn use_https(&self) -> bool {
        !self.is_development()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Name and version of the running binary, reported by `/health`.
#[derive(Clone, Copy, Debug)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Build an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Optional variable; blank values count as unset.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable into `T`, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_optional(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Like [`env_parse`], then rejects values outside `range`.
pub fn env_parse_in_range<T>(key: &str, default: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Display,
    T::Err: Display,
{
    let value = env_parse(key, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::OutOfRange {
            key: key.to_string(),
            details: format!(
                "{} is not within {}..={}",
                value,
                range.start(),
                range.end()
            ),
        });
    }
    Ok(value)
}

/// Boolean flag accepting `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_optional(key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::ParseError {
                key: key.to_string(),
                details: format!("'{}' is not a boolean", other),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_staging() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Staging);
            assert!(!env.is_development());
            assert!(!env.is_production());
            assert!(env.use_https());
        });
    }

    #[test]
    fn test_environment_production() {
        temp_env::with_var("APP_ENV", Some("production"), || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Production);
            assert!(env.is_production());
            assert!(env.use_https());
        });
    }

    #[test]
    fn test_environment_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("Development"), || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(!env.use_https());
        });
    }

    #[test]
    fn test_environment_unknown_is_staging() {
        temp_env::with_var("APP_ENV", Some("qa"), || {
            assert_eq!(Environment::from_env(), Environment::Staging);
        });
    }

    #[test]
    fn test_app_info_macro() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_or_default_with_value() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            let result = env_or_default("TEST_VAR", "default");
            assert_eq!(result, "test_value");
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR", || {
            let result = env_or_default("MISSING_VAR", "default_value");
            assert_eq!(result, "default_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("BLANK_VAR", Some("   "), || {
            assert_eq!(env_optional("BLANK_VAR"), None);
        });
        temp_env::with_var("SET_VAR", Some(" value "), || {
            assert_eq!(env_optional("SET_VAR").as_deref(), Some("value"));
        });
    }

    #[test]
    fn test_env_parse_invalid_number() {
        temp_env::with_var("NUM_VAR", Some("abc"), || {
            let err = env_parse::<u32>("NUM_VAR", 1).unwrap_err();
            assert!(err.to_string().contains("NUM_VAR"));
        });
    }

    #[test]
    fn test_env_parse_in_range_bounds() {
        temp_env::with_var("RANGE_VAR", Some("5"), || {
            assert_eq!(env_parse_in_range("RANGE_VAR", 60u32, 5..=1440).unwrap(), 5);
        });
        temp_env::with_var("RANGE_VAR", Some("1"), || {
            let err = env_parse_in_range("RANGE_VAR", 60u32, 5..=1440).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { .. }));
        });
        temp_env::with_var_unset("RANGE_VAR", || {
            assert_eq!(env_parse_in_range("RANGE_VAR", 60u32, 5..=1440).unwrap(), 60);
        });
    }

    #[test]
    fn test_env_parse_in_range_float() {
        temp_env::with_var("FLOAT_VAR", Some("0.05"), || {
            assert!(env_parse_in_range("FLOAT_VAR", 10.0f64, 0.1..=f64::MAX).is_err());
        });
    }

    #[test]
    fn test_env_bool() {
        temp_env::with_var("FLAG", Some("Yes"), || {
            assert!(env_bool("FLAG", false).unwrap());
        });
        temp_env::with_var("FLAG", Some("0"), || {
            assert!(!env_bool("FLAG", true).unwrap());
        });
        temp_env::with_var("FLAG", Some("maybe"), || {
            assert!(env_bool("FLAG", true).is_err());
        });
        temp_env::with_var_unset("FLAG", || {
            assert!(env_bool("FLAG", true).unwrap());
        });
    }
}
