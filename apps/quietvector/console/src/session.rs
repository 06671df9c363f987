//! Persisted login session.
//!
//! Lookup order for the file: `--session-file`, `QUIETVECTOR_SESSION`
//! (both handled by clap), then `$HOME/.quietvector/session.json`.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `explicit` when given, else the default under `$HOME`.
    pub fn resolve(explicit: Option<PathBuf>) -> ConsoleResult<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConsoleError::input("HOME is not set; pass --session-file"))?;
        Ok(Self::new(
            PathBuf::from(home).join(".quietvector").join("session.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> ConsoleResult<Option<Session>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but a missing session is an error.
    pub async fn require(&self) -> ConsoleResult<Session> {
        self.load().await?.ok_or(ConsoleError::NotLoggedIn)
    }

    pub async fn save(&self, session: &Session) -> ConsoleResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(session)?).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }

    /// Remove the session file. Returns whether one existed.
    pub async fn clear(&self) -> ConsoleResult<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
