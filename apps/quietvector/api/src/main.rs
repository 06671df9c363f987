use axum_helpers::create_production_app;
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::io::{self, BufRead};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "quietvector_api", version, about = "Admin API for a Qdrant vector store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print an argon2 hash for ADMIN_PASSWORD_HASH
    HashPassword {
        /// Read from stdin when omitted
        #[arg(long, env = "QUIETVECTOR_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::HashPassword { password } => hash_password(password),
    }
}

async fn serve() -> eyre::Result<()> {
    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.tracing);
    observability::init_metrics()?;

    info!(
        qdrant = %config.qdrant.base_url(),
        api_key = config.qdrant.resolve_api_key().is_some(),
        ops_apply = config.security.ops_apply_enabled,
        "Configuration loaded"
    );
    if config.admin.password_hash.is_none() {
        tracing::warn!("ADMIN_PASSWORD_HASH is not set; login will fail");
    }

    let server = config.server.clone();
    let state = AppState::new(config)?;
    let app = api::app(&state).await?;

    info!("Starting QuietVector API with production-ready shutdown (30s timeout)");

    create_production_app(app, &server, Duration::from_secs(30), async move {
        info!("Shutting down: no persistent state to flush");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("QuietVector API shutdown complete");
    Ok(())
}

fn hash_password(password: Option<String>) -> eyre::Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.len() < 3 {
        eyre::bail!("password must be at least 3 characters");
    }

    println!("{}", domain_auth::hash_password(&password)?);
    Ok(())
}
