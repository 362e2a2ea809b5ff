use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Provisioning failed: {0}")]
    Provision(#[from] core_store::ProvisionError),

    #[error("Resource error: {0}")]
    Hal(#[from] core_hal::HalError),
}

impl CoreError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            CoreError::Provision(e) => e.is_cancelled(),
            CoreError::Hal(e) => e.is_cancelled(),
            CoreError::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
