/// Shared error type used across all ChatDesk crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The chat endpoint answered with a non-2xx status.
    #[error("Chat API error: {status} {body}")]
    ChatApi { status: u16, body: String },

    #[error("storage: {0}")]
    Storage(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ChatApi { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures of the network exchange itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Timeout(_) | Error::ChatApi { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
