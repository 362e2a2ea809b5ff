//! Operations the message resource runs against the store.
//!
//! Each operation captures the request parameters parsed from the route and
//! knows how to invoke itself against a [`StreamStore`].

use store_traits::{
    CancellationToken, DeleteOutcome, Result, StreamMessage, StreamStore, StreamVersion,
};
use tracing::debug;

use crate::error::HalError;

/// Result of resolving a message read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found(StreamMessage),
    /// No message at that version, or no such stream.
    Absent,
}

impl ReadOutcome {
    pub fn message(&self) -> Option<&StreamMessage> {
        match self {
            ReadOutcome::Found(message) => Some(message),
            ReadOutcome::Absent => None,
        }
    }
}

fn parse_stream_id(stream_id: &str) -> std::result::Result<String, HalError> {
    if stream_id.is_empty() {
        return Err(HalError::InvalidStreamId);
    }
    Ok(stream_id.to_string())
}

fn parse_stream_version(segment: &str) -> std::result::Result<StreamVersion, HalError> {
    segment
        .parse()
        .map_err(|_| HalError::InvalidStreamVersion(segment.to_string()))
}

/// Read of a single message by stream version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStreamMessageOperation {
    stream_id: String,
    stream_version: StreamVersion,
}

impl ReadStreamMessageOperation {
    pub fn new(stream_id: impl Into<String>, stream_version: StreamVersion) -> Self {
        Self {
            stream_id: stream_id.into(),
            stream_version,
        }
    }

    /// Build from the `streams/{streamId}/{streamVersion}` route segments.
    pub fn from_path(
        stream_id: &str,
        stream_version: &str,
    ) -> std::result::Result<Self, HalError> {
        Ok(Self {
            stream_id: parse_stream_id(stream_id)?,
            stream_version: parse_stream_version(stream_version)?,
        })
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn stream_version(&self) -> StreamVersion {
        self.stream_version
    }

    pub async fn invoke(
        &self,
        store: &dyn StreamStore,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome> {
        let message = store
            .read_message(&self.stream_id, self.stream_version, cancel)
            .await?;

        Ok(match message {
            Some(message) if !message.is_empty() => ReadOutcome::Found(message),
            _ => {
                debug!(
                    stream_id = %self.stream_id,
                    stream_version = %self.stream_version,
                    "Message not found"
                );
                ReadOutcome::Absent
            }
        })
    }
}

/// Delete of a single message by concrete stream version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStreamMessageOperation {
    stream_id: String,
    stream_version: u64,
}

impl DeleteStreamMessageOperation {
    pub fn new(stream_id: impl Into<String>, stream_version: u64) -> Self {
        Self {
            stream_id: stream_id.into(),
            stream_version,
        }
    }

    /// Build from route segments. `End` is rejected: a delete must name the
    /// version it removes.
    pub fn from_path(
        stream_id: &str,
        stream_version: &str,
    ) -> std::result::Result<Self, HalError> {
        let version = parse_stream_version(stream_version)?
            .concrete()
            .ok_or_else(|| HalError::InvalidStreamVersion(stream_version.to_string()))?;

        Ok(Self {
            stream_id: parse_stream_id(stream_id)?,
            stream_version: version,
        })
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn stream_version(&self) -> u64 {
        self.stream_version
    }

    pub async fn invoke(
        &self,
        store: &dyn StreamStore,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        store
            .delete_message(&self.stream_id, self.stream_version, cancel)
            .await
    }
}
