//! Storage Engine Contract
//!
//! Abstracts the stream store behind a single trait so the resource layer
//! works unchanged across backends:
//! - In-memory: process-local, used for development and tests
//! - PostgreSQL: via sqlx
//! - SQL Server: via tiberius
//!
//! ## Usage
//!
//! ```ignore
//! use store_traits::{CancellationToken, StreamStore, StreamVersion};
//!
//! let cancel = CancellationToken::new();
//! let message = store.read_message("orders-1", StreamVersion::End, &cancel).await?;
//! ```

use async_trait::async_trait;

use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::message::{AppendResult, DeleteOutcome, NewStreamMessage, StreamMessage, StreamVersion};

/// Stream store trait implemented by every storage backend
///
/// ## Thread Safety
///
/// Implementations are shared as `Arc<dyn StreamStore>` across concurrent
/// requests and must be `Send + Sync`. Reads need no coordination between
/// themselves; conflicting writes are serialized by the engine.
///
/// ## Cancellation
///
/// Every I/O method takes a [`CancellationToken`]. When the token fires the
/// call returns [`StoreError::Cancelled`](crate::StoreError::Cancelled).
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Read the message header at `version` in `stream_id`.
    ///
    /// `StreamVersion::End` resolves to the latest message of the stream.
    ///
    /// # Returns
    /// - `Ok(Some(message))` if found
    /// - `Ok(None)` if the stream or version does not exist
    async fn read_message(
        &self,
        stream_id: &str,
        version: StreamVersion,
        cancel: &CancellationToken,
    ) -> Result<Option<StreamMessage>>;

    /// Read the raw JSON payload of a concrete message.
    async fn read_message_data(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// Delete the message at a concrete version.
    ///
    /// Deleting an absent message is not an error and yields
    /// [`DeleteOutcome::NotFound`].
    async fn delete_message(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome>;

    /// Append messages at the end of a stream, creating it if needed.
    ///
    /// No expected-version check is performed.
    async fn append_to_stream(
        &self,
        stream_id: &str,
        messages: Vec<NewStreamMessage>,
        cancel: &CancellationToken,
    ) -> Result<AppendResult>;

    /// Create the store's schema when it is not already present.
    ///
    /// Must be safe to call against an initialized database and must not
    /// alter stored messages.
    async fn create_schema_if_not_exists(&self, cancel: &CancellationToken) -> Result<()>;

    /// The DDL that [`create_schema_if_not_exists`](Self::create_schema_if_not_exists)
    /// runs, for operators who need to apply it by hand.
    fn schema_creation_script(&self) -> String;
}
