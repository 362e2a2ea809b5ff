//! The stream message resource: `streams/{streamId}/{streamVersion}`.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use store_traits::{CancellationToken, StreamStore, StreamVersion};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::headers::{
    etag_from_stream_version, CACHE_CONTROL, CACHE_CONTROL_ONE_YEAR, ETAG, LOCATION,
};
use crate::links::{rel, Links, ROOT};
use crate::operations::{DeleteStreamMessageOperation, ReadOutcome, ReadStreamMessageOperation};
use crate::response::{Method, Response, NOT_FOUND, OK, TEMPORARY_REDIRECT};

const ALLOWED: &[Method] = &[Method::Get, Method::Head, Method::Options];

/// Description of the delete affordance embedded in a found message.
pub fn delete_message_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Delete Stream Message",
        "description": "Deletes the message at this stream version. Deleting a missing message succeeds.",
        "method": Method::Delete.as_str(),
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

fn hal(mut body: Map<String, Value>, links: &Links) -> Value {
    body.insert("_links".to_string(), links.to_json());
    Value::Object(body)
}

/// Serves single messages from a shared store.
#[derive(Clone)]
pub struct StreamMessageResource {
    store: Arc<dyn StreamStore>,
}

impl StreamMessageResource {
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self { store }
    }

    /// Methods the resource answers on its own route.
    pub fn allowed(&self) -> &'static [Method] {
        ALLOWED
    }

    /// Read a message.
    ///
    /// - absent: `404` echoing the requested stream id and version
    /// - requested `End`: `307` to the concrete latest version
    /// - found: `200` with the message, a strong `ETag` and a one-year
    ///   immutable `Cache-Control`
    #[instrument(skip(self, operation, cancel), fields(
        stream_id = %operation.stream_id(),
        stream_version = %operation.stream_version(),
    ))]
    pub async fn get(
        &self,
        operation: &ReadStreamMessageOperation,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let outcome = operation.invoke(self.store.as_ref(), cancel).await?;

        let link_version = outcome
            .message()
            .map(|message| StreamVersion::Concrete(message.stream_version))
            .unwrap_or_else(|| operation.stream_version());
        let links = Links::rooted_at(ROOT)
            .index()
            .find()
            .navigation(operation.stream_id(), link_version);

        let message = match outcome {
            ReadOutcome::Absent => {
                let mut body = Map::new();
                body.insert("streamId".to_string(), json!(operation.stream_id()));
                body.insert("streamVersion".to_string(), json!(operation.stream_version()));
                return Ok(Response::new(NOT_FOUND, hal(body, &links)));
            }
            ReadOutcome::Found(message) => message,
        };

        if operation.stream_version().is_end() {
            debug!(resolved = message.stream_version, "Redirecting to latest version");
            return Ok(Response::empty(TEMPORARY_REDIRECT)
                .with_header(LOCATION, message.stream_version.to_string()));
        }

        let payload: Value =
            serde_json::from_str(&message.json_data(self.store.as_ref(), cancel).await?)?;

        let mut body = Map::new();
        body.insert("messageId".to_string(), json!(message.message_id));
        body.insert("createdUtc".to_string(), json!(message.created_utc));
        body.insert("position".to_string(), json!(message.position));
        body.insert("streamId".to_string(), json!(message.stream_id));
        body.insert("streamVersion".to_string(), json!(message.stream_version));
        body.insert("type".to_string(), json!(message.message_type));
        body.insert("payload".to_string(), payload);
        body.insert("metadata".to_string(), json!(message.json_metadata));

        let mut embedded = Map::new();
        embedded.insert(rel::DELETE_MESSAGE.to_string(), delete_message_schema());
        body.insert("_embedded".to_string(), Value::Object(embedded));

        Ok(Response::ok(hal(body, &links))
            .with_header(ETAG, etag_from_stream_version(message.stream_version))
            .with_header(CACHE_CONTROL, CACHE_CONTROL_ONE_YEAR))
    }

    /// Delete a message. Deleting a missing message also answers `200`.
    #[instrument(skip(self, operation, cancel), fields(
        stream_id = %operation.stream_id(),
        stream_version = operation.stream_version(),
    ))]
    pub async fn delete_message(
        &self,
        operation: &DeleteStreamMessageOperation,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let outcome = operation.invoke(self.store.as_ref(), cancel).await?;
        debug!(?outcome, "Delete handled");

        Ok(Response::empty(OK))
    }
}
