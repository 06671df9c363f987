use clap::{Args, Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{TracingConfig, init_tracing, install_color_eyre};
use domain_vector::Distance;
use std::path::PathBuf;
use tracing::debug;

mod client;
mod error;
mod prompt;
mod session;
mod table;
mod views;

use client::{ApiClient, DEFAULT_API_URL};
use error::{ConsoleError, ConsoleResult};
use prompt::Prompt;
use session::SessionStore;
use views::{collections, insert, search, security, shell, snapshots, stats};

#[derive(Parser)]
#[command(name = "quietvector", version, about = "Operator console for the QuietVector API")]
struct Cli {
    /// Base URL of the QuietVector API
    #[arg(long, global = true, env = "QUIETVECTOR_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where the login session is stored
    #[arg(long, global = true, env = "QUIETVECTOR_SESSION")]
    session_file: Option<PathBuf>,

    /// Sent as x-api-key when the API requires one
    #[arg(long, global = true, env = "QUIETVECTOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        /// Prompted for when omitted
        #[arg(long)]
        username: Option<String>,
        /// Prompted for when omitted
        #[arg(long, env = "QUIETVECTOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// List or create collections
    Collections {
        #[command(subcommand)]
        action: Option<CollectionsAction>,
    },
    /// Nearest-neighbour search
    Search {
        #[arg(long)]
        collection: String,
        /// Comma separated numbers
        #[arg(long, allow_hyphen_values = true)]
        vector: String,
        #[arg(long, default_value_t = search::DEFAULT_LIMIT)]
        limit: u32,
        /// Leave payloads out of the results
        #[arg(long)]
        no_payload: bool,
    },
    /// Upsert points from a JSON array
    Insert {
        #[arg(long)]
        collection: String,
        #[command(flatten)]
        source: PointsSource,
    },
    /// Manage collection snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotsAction,
    },
    /// Rotate the vector store key
    Security {
        #[command(subcommand)]
        action: SecurityAction,
    },
    /// Show store statistics
    Stats,
    /// Interactive tabbed console
    Shell,
}

#[derive(Subcommand)]
enum CollectionsAction {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = collections::DEFAULT_SIZE)]
        size: u64,
        #[arg(long, default_value = "Cosine")]
        distance: Distance,
    },
}

/// At least one source; `--file` wins when both are given.
#[derive(Args)]
#[group(required = true)]
struct PointsSource {
    /// Path to a JSON file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Inline JSON
    #[arg(long)]
    json: Option<String>,
}

#[derive(Subcommand)]
enum SnapshotsAction {
    List {
        #[arg(long)]
        collection: String,
    },
    Create {
        #[arg(long)]
        collection: String,
    },
    /// Upload a snapshot file and recover the collection from it
    Restore {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        file: PathBuf,
    },
    Download {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        name: String,
        /// Defaults to the snapshot name in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SecurityAction {
    /// Write a new key file on the server
    RotateKey,
    /// Restart the vector store so it picks up the new key
    Apply {
        #[arg(long)]
        dry_run: bool,
    },
    /// Show a tracked operation
    Op { op_id: String },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    if cli.verbose {
        init_tracing(&TracingConfig::new(Environment::Development, false));
    }

    let store = SessionStore::resolve(cli.session_file.clone())?;
    debug!(session = %store.path().display(), api = %cli.api_url, "console starting");

    run(cli, &store).await?;
    Ok(())
}

async fn run(cli: Cli, store: &SessionStore) -> ConsoleResult<()> {
    let client = ApiClient::new(&cli.api_url, cli.api_key.clone())?;

    let output = match cli.command {
        Command::Login { username, password } => {
            let mut prompt = Prompt::stdio();
            let username = match username {
                Some(username) => username,
                None => prompt
                    .ask_or("username", "admin")?
                    .ok_or_else(|| ConsoleError::input("username is required"))?,
            };
            let password = match password {
                Some(password) => password,
                None => prompt
                    .ask("password")?
                    .ok_or_else(|| ConsoleError::input("password is required"))?,
            };
            let session = client.login(&username, &password).await?;
            store.save(&session).await?;
            format!("logged in as {username}")
        }
        Command::Logout => {
            if store.clear().await? {
                "logged out".to_string()
            } else {
                "no session".to_string()
            }
        }
        command => {
            // Everything else needs a session; fail before any request.
            let client = client.with_session(store.require().await?);
            match authed(command, &client, store).await {
                Ok(output) => output,
                Err(e) if e.is_unauthorized() => {
                    store.clear().await?;
                    return Err(ConsoleError::SessionExpired);
                }
                Err(e) => return Err(e),
            }
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

async fn authed(command: Command, client: &ApiClient, store: &SessionStore) -> ConsoleResult<String> {
    match command {
        Command::Collections { action } => match action.unwrap_or(CollectionsAction::List) {
            CollectionsAction::List => collections::list(client).await,
            CollectionsAction::Create {
                name,
                size,
                distance,
            } => collections::create(client, &name, size, distance).await,
        },
        Command::Search {
            collection,
            vector,
            limit,
            no_payload,
        } => search::run(client, &collection, &vector, limit, !no_payload).await,
        Command::Insert { collection, source } => {
            let text = insert::load_text(source.file.as_deref(), source.json.as_deref()).await?;
            insert::run(client, &collection, &text).await
        }
        Command::Snapshots { action } => match action {
            SnapshotsAction::List { collection } => snapshots::list(client, &collection).await,
            SnapshotsAction::Create { collection } => snapshots::create(client, &collection).await,
            SnapshotsAction::Restore { collection, file } => {
                snapshots::restore(client, &collection, &file).await
            }
            SnapshotsAction::Download {
                collection,
                name,
                out,
            } => {
                let out = out.unwrap_or_else(|| PathBuf::from(&name));
                snapshots::download(client, &collection, &name, &out).await
            }
        },
        Command::Security { action } => match action {
            SecurityAction::RotateKey => security::rotate_key(client, &mut Prompt::stdio()).await,
            SecurityAction::Apply { dry_run } => {
                security::apply(client, &mut Prompt::stdio(), dry_run).await
            }
            SecurityAction::Op { op_id } => security::op(client, &op_id).await,
        },
        Command::Stats => stats::show(client).await,
        Command::Shell => shell::run(client, store, &mut Prompt::stdio())
            .await
            .map(|()| String::new()),
        Command::Login { .. } | Command::Logout => Ok(String::new()),
    }
}
