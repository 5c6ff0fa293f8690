use thiserror::Error;

/// Failure of a single chat completion call
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connection refused, timeout, or the body could not be read
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or rejected credential
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-success response from the service
    #[error("service error {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered with something we could not parse
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The call never settled normally, e.g. its task panicked
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Short classification used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Transport(_) => "transport",
            ChatError::Auth(_) => "auth",
            ChatError::Service { .. } => "service",
            ChatError::Malformed(_) => "malformed",
            ChatError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            ChatError::Transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            ChatError::Malformed(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
