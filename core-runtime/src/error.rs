use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No provider factory for provider '{0}' found")]
    UnsupportedProvider(String),

    #[error("Invalid schema name '{name}': {message}")]
    InvalidSchema { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
