use crate::transport::TransportError;
use thiserror::Error;

/// Structured error surfaced through a session's settled outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {message}")]
    Transport { message: String, cancelled: bool },

    #[error("application error: {message}")]
    Application {
        message: String,
        code: Option<String>,
    },
}

impl UploadError {
    /// True when the failure was caused by an explicit user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Transport { cancelled: true, .. })
    }
}

impl From<TransportError> for UploadError {
    fn from(err: TransportError) -> Self {
        let cancelled = matches!(err, TransportError::Cancelled);
        UploadError::Transport {
            message: err.to_string(),
            cancelled,
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid session transition: {0}")]
    InvalidTransition(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
