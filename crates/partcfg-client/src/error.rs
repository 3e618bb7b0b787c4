use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("a request for this action is already in flight")]
    Busy,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed server response: {0}")]
    InvalidResponse(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("fallback export failed: {0}")]
    Export(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Failures of the remote side or the transport, as opposed to local misuse.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::InvalidResponse(_)
        )
    }
}
