//! In-memory stream store
//!
//! Process-local storage used for development and tests. Nothing is
//! persisted and there is no schema to provision.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use store_traits::{
    cancellable, AppendResult, CancellationToken, DeleteOutcome, NewStreamMessage, Result,
    StoreError, StreamMessage, StreamStore, StreamVersion,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredMessage {
    message: StreamMessage,
    json_data: String,
}

#[derive(Debug, Default)]
struct StreamRecord {
    messages: BTreeMap<u64, StoredMessage>,
    next_version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<String, StreamRecord>,
    next_position: i64,
}

/// In-memory implementation of [`StreamStore`]
///
/// Reads take a shared lock and writes an exclusive one. Versions are never
/// reused: deleting the last message of a stream does not rewind the next
/// version handed out by [`append_to_stream`](StreamStore::append_to_stream).
#[derive(Debug, Default)]
pub struct InMemoryStreamStore {
    inner: RwLock<Inner>,
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently held across all streams.
    pub async fn message_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.streams.values().map(|s| s.messages.len()).sum()
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn read_message(
        &self,
        stream_id: &str,
        version: StreamVersion,
        cancel: &CancellationToken,
    ) -> Result<Option<StreamMessage>> {
        cancellable(cancel, async {
            let inner = self.inner.read().await;
            let Some(stream) = inner.streams.get(stream_id) else {
                return Ok(None);
            };

            let stored = match version {
                StreamVersion::End => stream.messages.values().next_back(),
                StreamVersion::Concrete(v) => stream.messages.get(&v),
            };

            Ok(stored.map(|stored| {
                let mut message = stored.message.clone();
                message.prefetched_json_data = Some(stored.json_data.clone());
                message
            }))
        })
        .await
    }

    async fn read_message_data(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        cancellable(cancel, async {
            let inner = self.inner.read().await;
            Ok(inner
                .streams
                .get(stream_id)
                .and_then(|stream| stream.messages.get(&version))
                .map(|stored| stored.json_data.clone()))
        })
        .await
    }

    async fn delete_message(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        cancellable(cancel, async {
            let mut inner = self.inner.write().await;
            let removed = inner
                .streams
                .get_mut(stream_id)
                .and_then(|stream| stream.messages.remove(&version));

            let outcome = if removed.is_some() {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::NotFound
            };

            debug!(stream_id, stream_version = version, ?outcome, "Deleted message");
            Ok(outcome)
        })
        .await
    }

    async fn append_to_stream(
        &self,
        stream_id: &str,
        messages: Vec<NewStreamMessage>,
        cancel: &CancellationToken,
    ) -> Result<AppendResult> {
        if messages.is_empty() {
            return Err(StoreError::OperationFailed(
                "Cannot append an empty batch".to_string(),
            ));
        }

        cancellable(cancel, async {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let stream = inner.streams.entry(stream_id.to_string()).or_default();

            let mut result = None;
            for new_message in messages {
                let stream_version = stream.next_version;
                let position = inner.next_position;

                stream.messages.insert(
                    stream_version,
                    StoredMessage {
                        message: StreamMessage {
                            message_id: new_message.message_id,
                            stream_id: stream_id.to_string(),
                            stream_version,
                            position,
                            created_utc: Utc::now(),
                            message_type: new_message.message_type,
                            json_metadata: new_message.json_metadata,
                            prefetched_json_data: None,
                        },
                        json_data: new_message.json_data,
                    },
                );

                stream.next_version += 1;
                inner.next_position += 1;
                result = Some(AppendResult {
                    current_version: stream_version,
                    current_position: position,
                });
            }

            result.ok_or_else(|| StoreError::OperationFailed("Nothing appended".to_string()))
        })
        .await
    }

    async fn create_schema_if_not_exists(&self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    fn schema_creation_script(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn seeded(stream_id: &str, count: usize) -> InMemoryStreamStore {
        let store = InMemoryStreamStore::new();
        let messages = (0..count)
            .map(|i| NewStreamMessage::new(Uuid::new_v4(), "event", format!(r#"{{"n":{}}}"#, i)))
            .collect();
        store
            .append_to_stream(stream_id, messages, &CancellationToken::new())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_append_assigns_contiguous_versions_and_positions() {
        let store = InMemoryStreamStore::new();
        let cancel = CancellationToken::new();

        let first = store
            .append_to_stream(
                "a",
                vec![
                    NewStreamMessage::new(Uuid::new_v4(), "x", "{}"),
                    NewStreamMessage::new(Uuid::new_v4(), "x", "{}"),
                ],
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(first.current_version, 1);
        assert_eq!(first.current_position, 1);

        let second = store
            .append_to_stream("b", vec![NewStreamMessage::new(Uuid::new_v4(), "x", "{}")], &cancel)
            .await
            .unwrap();
        assert_eq!(second.current_version, 0);
        assert_eq!(second.current_position, 2);
    }

    #[tokio::test]
    async fn test_read_concrete_and_end() {
        let store = seeded("orders-1", 5).await;
        let cancel = CancellationToken::new();

        let message = store
            .read_message("orders-1", StreamVersion::Concrete(2), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.stream_version, 2);
        assert_eq!(message.prefetched_json_data.as_deref(), Some(r#"{"n":2}"#));

        let last = store
            .read_message("orders-1", StreamVersion::End, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.stream_version, 4);
    }

    #[tokio::test]
    async fn test_read_missing_returns_none() {
        let store = seeded("orders-1", 1).await;
        let cancel = CancellationToken::new();

        assert!(store
            .read_message("orders-1", StreamVersion::Concrete(10), &cancel)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .read_message("unknown", StreamVersion::End, &cancel)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded("orders-1", 3).await;
        let cancel = CancellationToken::new();

        assert_eq!(
            store.delete_message("orders-1", 1, &cancel).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete_message("orders-1", 1, &cancel).await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(
            store.delete_message("nope", 0, &cancel).await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(store.message_count().await, 2);
    }

    #[tokio::test]
    async fn test_versions_not_reused_after_deleting_head() {
        let store = seeded("orders-1", 2).await;
        let cancel = CancellationToken::new();

        store.delete_message("orders-1", 1, &cancel).await.unwrap();
        let result = store
            .append_to_stream(
                "orders-1",
                vec![NewStreamMessage::new(Uuid::new_v4(), "x", "{}")],
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(result.current_version, 2);
    }

    #[tokio::test]
    async fn test_empty_append_rejected() {
        let store = InMemoryStreamStore::new();
        let result = store
            .append_to_stream("a", Vec::new(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(StoreError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let store = seeded("orders-1", 1).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = store
            .read_message("orders-1", StreamVersion::End, &cancel)
            .await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_schema_creation_is_noop() {
        let store = seeded("orders-1", 2).await;
        store
            .create_schema_if_not_exists(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(store.message_count().await, 2);
        assert!(store.schema_creation_script().is_empty());
    }
}
