use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog download failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },
    #[error("{0} not found in catalog response")]
    DataNotFound(String),
    #[error("malformed element set for {object}: {message}")]
    Malformed { object: String, message: String },
}

impl FetchError {
    /// Data-shape failures: the network answered, the payload was wrong
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            FetchError::DataNotFound(_) | FetchError::Malformed { .. }
        )
    }
}
