use thiserror::Error;

/// Failures talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request failed with status {status}")]
    Status {
        status: u16,
        /// `error` field of the response body, when the server sent one.
        message: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Failed to open {name}: {source}")]
    File {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
