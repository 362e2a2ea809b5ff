//! Core service façade and bootstrap helpers.
//!
//! Startup reads a [`ServerConfig`], provisions the configured backend once
//! and hands out resources that share the resulting store. HTTP routing is
//! left to the host, which calls into [`StreamStoreService::stream_message`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_hal::StreamMessageResource;
use core_runtime::logging::init_logging;
use core_runtime::ServerConfig;
use core_store::BackendProvisioner;
use store_traits::{CancellationToken, StreamStore};
use tracing::{debug, info};

/// Primary façade exposed to hosts.
#[derive(Clone)]
pub struct StreamStoreService {
    config: Arc<ServerConfig>,
    store: Arc<dyn StreamStore>,
    stream_message: StreamMessageResource,
}

impl StreamStoreService {
    /// Provision the configured backend and build the resources on top of it.
    pub async fn bootstrap(config: ServerConfig, cancel: &CancellationToken) -> Result<Self> {
        let store = BackendProvisioner::new(config.clone())
            .provision(cancel)
            .await?;

        info!(provider = %config.provider, "Stream store ready");
        Ok(Self::with_store(config, store))
    }

    /// Wrap an already provisioned store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn StreamStore>) -> Self {
        Self {
            config: Arc::new(config),
            stream_message: StreamMessageResource::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared storage handle.
    pub fn store(&self) -> Arc<dyn StreamStore> {
        Arc::clone(&self.store)
    }

    pub fn stream_message(&self) -> &StreamMessageResource {
        &self.stream_message
    }
}

/// Bootstrap from `STREAMSTORE_*` environment variables.
///
/// Installs the configured logging subscriber unless the host already
/// installed one.
pub async fn bootstrap_from_env(cancel: &CancellationToken) -> Result<StreamStoreService> {
    let config = ServerConfig::from_env()?;

    if let Err(e) = init_logging(config.logging.clone()) {
        debug!(error = %e, "Keeping existing logging subscriber");
    }

    StreamStoreService::bootstrap(config, cancel).await
}
