//! # Stream Store Backends
//!
//! Storage engines behind [`store_traits::StreamStore`] and the provisioning
//! logic that prepares them at startup.
//!
//! ## Overview
//!
//! This crate provides:
//! - In-memory, PostgreSQL (`sqlx`) and SQL Server (`tiberius`) engines
//! - Administrative connection targets used to create missing databases
//! - Idempotent schema scripts
//! - [`BackendProvisioner`], which turns a `ServerConfig` into a shared store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_store::BackendProvisioner;
//! use store_traits::CancellationToken;
//!
//! let store = BackendProvisioner::new(config)
//!     .provision(&CancellationToken::new())
//!     .await?;
//! ```

pub mod adapters;
pub mod connection;
pub mod db;
pub mod error;
pub mod provisioner;
pub mod schema;

pub use adapters::{InMemoryStreamStore, MssqlStreamStore, PostgresStreamStore};
pub use error::{ProvisionError, Result};
pub use provisioner::{
    ensure_database_exists, initialize_store, provision, BackendProvisioner, DatabaseBootstrap,
    MssqlBootstrap, PostgresBootstrap,
};
