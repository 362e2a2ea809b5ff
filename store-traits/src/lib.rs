//! # Stream Store Traits
//!
//! The contract between the resource layer and the storage engines.
//!
//! ## Overview
//!
//! This crate defines the types every backend speaks:
//!
//! - [`StreamStore`](store::StreamStore) - read, delete, append and schema bootstrap
//! - [`StreamMessage`](message::StreamMessage) - a message header plus deferred payload
//! - [`StreamVersion`](message::StreamVersion) - concrete version or `End`
//! - [`StoreError`](error::StoreError) - engine failures, including cancellation
//!
//! ## Error Handling
//!
//! Engines convert driver errors (`sqlx`, `tiberius`) into `StoreError` so
//! callers never depend on a specific database crate.

pub mod cancellation;
pub mod error;
pub mod message;
pub mod store;

pub use cancellation::{cancellable, CancellationToken};
pub use error::{Result, StoreError};
pub use message::{
    AppendResult, DeleteOutcome, NewStreamMessage, ParseStreamVersionError, StreamMessage,
    StreamVersion,
};
pub use store::StreamStore;
