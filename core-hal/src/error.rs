use store_traits::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Message payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Invalid stream version '{0}'")]
    InvalidStreamVersion(String),

    #[error("Stream id must not be empty")]
    InvalidStreamId,

    #[error("Request cancelled")]
    Cancelled,
}

impl HalError {
    /// `true` when the request was aborted rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HalError::Cancelled)
    }
}

impl From<StoreError> for HalError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Cancelled => HalError::Cancelled,
            other => HalError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, HalError>;
