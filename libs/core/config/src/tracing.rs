use crate::{env_bool, ConfigError, Environment, FromEnv};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in the main() before any fallible operations to ensure
/// colored error output. Safe to call multiple times.
///
/// Configuration:
/// - Shows file:line where errors occur
/// - Hides environment variables (less noise)
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Log output settings.
///
/// - `APP_ENV`: picks the default verbosity
/// - `LOG_JSON`: JSON lines when true (default), pretty output otherwise
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub environment: Environment,
    pub json: bool,
}

impl TracingConfig {
    pub fn new(environment: Environment, json: bool) -> Self {
        Self { environment, json }
    }
}

impl FromEnv for TracingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            json: env_bool("LOG_JSON", true)?,
        })
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **JSON** (`LOG_JSON=true`): one JSON object per event for log shippers,
///   module targets hidden, fields flattened.
/// - **Pretty** (`LOG_JSON=false`): human-readable multi-line output.
///
/// Both variants install `tracing_error::ErrorLayer` so eyre reports carry
/// span traces. `RUST_LOG` overrides the default filter, which is `info` in
/// production and `debug` elsewhere.
///
/// Safe to call more than once; later calls are no-ops (common in tests).
pub fn init_tracing(config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.environment.is_production() {
            EnvFilter::new("info,tower_http=info,hyper=warn,reqwest=warn")
        } else {
            EnvFilter::new("debug,hyper=info,h2=info,rustls=info")
        }
    });

    let result = if config.json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                environment = config.environment.as_str(),
                json = config.json,
                "Tracing initialized with ErrorLayer"
            );
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}
