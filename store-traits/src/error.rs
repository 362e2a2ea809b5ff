use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store operation cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Message not found: stream {stream_id} version {stream_version}")]
    MessageNotFound {
        stream_id: String,
        stream_version: u64,
    },

    #[error("Invalid schema name: {0}")]
    InvalidSchema(String),

    #[error("Store operation failed: {0}")]
    OperationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// `true` when the operation was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
