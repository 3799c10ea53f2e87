use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("upload cancelled")]
    Cancelled,

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("failed to read response body: {0}")]
    BodyError(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
