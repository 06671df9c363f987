use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("not logged in; run `login` first")]
    NotLoggedIn,

    /// The stored session was rejected and has been removed
    #[error("session expired; run `login` again")]
    SessionExpired,

    /// Non-2xx answer; `message` is the server's error message or raw body
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Rejected locally before any request was sent
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// The stored session was rejected by the server.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
