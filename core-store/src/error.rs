use store_traits::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Could not ensure database '{database}' exists: {source}")]
    DatabaseCreation {
        database: String,
        #[source]
        source: StoreError,
    },

    #[error("Could not create schema: {0}")]
    SchemaCreation(#[source] StoreError),

    #[error("Provisioning cancelled")]
    Cancelled,
}

impl ProvisionError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            ProvisionError::Cancelled => true,
            ProvisionError::DatabaseCreation { source, .. } => source.is_cancelled(),
            ProvisionError::SchemaCreation(source) => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Convert a sqlx error into the engine-neutral [`StoreError`].
pub(crate) fn sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Io(io) => StoreError::Io(io),
        other => StoreError::DatabaseError(other.to_string()),
    }
}

/// Convert a tiberius error into the engine-neutral [`StoreError`].
pub(crate) fn mssql_error(error: tiberius::error::Error) -> StoreError {
    StoreError::DatabaseError(error.to_string())
}
