//! Interactive loop over the five tabs.

use domain_vector::Distance;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::client::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::prompt::Prompt;
use crate::session::SessionStore;
use crate::views::{collections, insert, search, security, snapshots};

pub const TAB_BAR: &str = "collections | search | insert | snapshots | security";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Collections,
    Search,
    Insert,
    Snapshots,
    Security,
    Logout,
    Quit,
}

impl Tab {
    fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_lowercase().as_str() {
            "collections" => Some(Tab::Collections),
            "search" => Some(Tab::Search),
            "insert" => Some(Tab::Insert),
            "snapshots" => Some(Tab::Snapshots),
            "security" => Some(Tab::Security),
            "logout" => Some(Tab::Logout),
            "quit" | "exit" => Some(Tab::Quit),
            _ => None,
        }
    }
}

/// Like `ask`, but end of input cancels the form.
fn field<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>, label: &str) -> ConsoleResult<String> {
    prompt
        .ask(label)?
        .ok_or_else(|| ConsoleError::input("cancelled"))
}

fn field_or<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    label: &str,
    default: &str,
) -> ConsoleResult<String> {
    prompt
        .ask_or(label, default)?
        .ok_or_else(|| ConsoleError::input("cancelled"))
}

fn parse_number<T: std::str::FromStr>(label: &str, raw: &str) -> ConsoleResult<T> {
    raw.parse()
        .map_err(|_| ConsoleError::input(format!("{label} must be a number")))
}

async fn collections_tab<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    match field_or(prompt, "action (list/create)", "list")?.as_str() {
        "create" => {
            let name = field(prompt, "name")?;
            let size = parse_number("size", &field_or(prompt, "size", &collections::DEFAULT_SIZE.to_string())?)?;
            let distance: Distance = field_or(prompt, "distance", "Cosine")?
                .parse()
                .map_err(ConsoleError::Input)?;
            collections::create(client, &name, size, distance).await
        }
        _ => collections::list(client).await,
    }
}

async fn search_tab<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    let collection = field(prompt, "collection")?;
    let vector = field(prompt, "vector")?;
    let limit = parse_number("limit", &field_or(prompt, "limit", &search::DEFAULT_LIMIT.to_string())?)?;
    let with_payload = !field_or(prompt, "include payload (y/n)", "y")?.eq_ignore_ascii_case("n");
    search::run(client, &collection, &vector, limit, with_payload).await
}

async fn insert_tab<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    let collection = field(prompt, "collection")?;
    let source = field(prompt, "points (JSON array, or @path)")?;

    let text = match source.strip_prefix('@') {
        Some(path) => insert::load_text(Some(PathBuf::from(path).as_path()), None).await?,
        None => source,
    };
    insert::run(client, &collection, &text).await
}

async fn snapshots_tab<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    let collection = field(prompt, "collection")?;
    match field_or(prompt, "action (list/create/restore/download)", "list")?.as_str() {
        "create" => snapshots::create(client, &collection).await,
        "restore" => {
            let file = field(prompt, "snapshot file")?;
            if file.is_empty() {
                return Err(ConsoleError::input("snapshot file is required"));
            }
            snapshots::restore(client, &collection, PathBuf::from(file).as_path()).await
        }
        "download" => {
            let name = field(prompt, "snapshot name")?;
            let out = field_or(prompt, "save to", &name)?;
            snapshots::download(client, &collection, &name, PathBuf::from(out).as_path()).await
        }
        _ => snapshots::list(client, &collection).await,
    }
}

async fn security_tab<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    match field_or(prompt, "action (rotate-key/apply/dry-run/op)", "rotate-key")?.as_str() {
        "apply" => security::apply(client, prompt, false).await,
        "dry-run" => security::apply(client, prompt, true).await,
        "op" => {
            let op_id = field(prompt, "operation id")?;
            security::op(client, &op_id).await
        }
        _ => security::rotate_key(client, prompt).await,
    }
}

/// Runs until `quit`, `logout` or end of input. A 401 ends the loop with
/// the error so the caller can drop the stale session.
pub async fn run<R: BufRead, W: Write>(
    client: &ApiClient,
    store: &SessionStore,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<()> {
    loop {
        prompt.say("")?;
        prompt.say(TAB_BAR)?;
        let Some(choice) = prompt.ask("tab (or logout/quit)")? else {
            return Ok(());
        };

        let result = match Tab::parse(&choice) {
            Some(Tab::Collections) => collections_tab(client, prompt).await,
            Some(Tab::Search) => search_tab(client, prompt).await,
            Some(Tab::Insert) => insert_tab(client, prompt).await,
            Some(Tab::Snapshots) => snapshots_tab(client, prompt).await,
            Some(Tab::Security) => security_tab(client, prompt).await,
            Some(Tab::Logout) => {
                store.clear().await?;
                prompt.say("logged out")?;
                return Ok(());
            }
            Some(Tab::Quit) => return Ok(()),
            None => {
                if !choice.is_empty() {
                    prompt.say(&format!("unknown tab: {choice}"))?;
                }
                continue;
            }
        };

        match result {
            Ok(text) => prompt.say(&text)?,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => prompt.say(&format!("error: {e}"))?,
        }
    }
}
