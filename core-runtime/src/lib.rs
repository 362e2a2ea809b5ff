//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the stream store server:
//! - Configuration management and provider selection
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Every other crate in the workspace reads its settings from
//! [`ServerConfig`](config::ServerConfig) and logs through `tracing`; this
//! crate owns both so startup has a single place to fail fast.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ProviderKind, ServerConfig, ServerConfigBuilder};
pub use error::{Error, Result};
