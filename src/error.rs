// src/error.rs
use thiserror::Error;

/// Errors surfaced by the agent backend clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection or body read failure. Never retried.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response on a buffered call.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body is missing the expected field.
    #[error("Backend response did not include {field}")]
    MalformedResponse { field: &'static str },

    /// Non-2xx response on the streamed call.
    #[error("Stream failed: {status}")]
    StreamStatus { status: u16 },
}

impl ClientError {
    /// Error for a failed buffered call, falling back to a generic message.
    pub fn status(status: u16, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("Backend request failed: {}", status));
        ClientError::Status { status, message }
    }

    /// HTTP status attached to the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::StreamStatus { status } => {
                Some(*status)
            }
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
