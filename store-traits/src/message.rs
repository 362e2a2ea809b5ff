//! Stream message model shared by every storage engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::error::{Result, StoreError};
use crate::store::StreamStore;

// =============================================================================
// Stream Version
// =============================================================================

/// Logical stream version addressed by a read.
///
/// `End` means "the latest version at read time". On the wire it is `-1`,
/// concrete versions are non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamVersion {
    Concrete(u64),
    End,
}

impl StreamVersion {
    /// Wire value of [`StreamVersion::End`].
    pub const END_WIRE_VALUE: i64 = -1;

    pub fn is_end(&self) -> bool {
        matches!(self, StreamVersion::End)
    }

    /// The concrete version, if this is not `End`.
    pub fn concrete(&self) -> Option<u64> {
        match self {
            StreamVersion::Concrete(version) => Some(*version),
            StreamVersion::End => None,
        }
    }

    /// Signed wire value, or `None` for a version beyond `i64::MAX`.
    pub fn to_wire(&self) -> Option<i64> {
        match self {
            StreamVersion::Concrete(version) => i64::try_from(*version).ok(),
            StreamVersion::End => Some(Self::END_WIRE_VALUE),
        }
    }

    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            Self::END_WIRE_VALUE => Some(StreamVersion::End),
            v if v >= 0 => Some(StreamVersion::Concrete(v as u64)),
            _ => None,
        }
    }
}

impl From<u64> for StreamVersion {
    fn from(version: u64) -> Self {
        StreamVersion::Concrete(version)
    }
}

impl fmt::Display for StreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamVersion::Concrete(version) => write!(f, "{}", version),
            StreamVersion::End => write!(f, "{}", Self::END_WIRE_VALUE),
        }
    }
}

/// Error returned when a stream version cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStreamVersionError(pub String);

impl fmt::Display for ParseStreamVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid stream version '{}'", self.0)
    }
}

impl std::error::Error for ParseStreamVersionError {}

impl FromStr for StreamVersion {
    type Err = ParseStreamVersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s_trimmed = s.trim();
        if let Ok(version) = s_trimmed.parse::<u64>() {
            return Ok(StreamVersion::Concrete(version));
        }
        s_trimmed
            .parse::<i64>()
            .ok()
            .and_then(StreamVersion::from_wire)
            .ok_or_else(|| ParseStreamVersionError(s.to_string()))
    }
}

impl Serialize for StreamVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StreamVersion::Concrete(version) => serializer.serialize_u64(*version),
            StreamVersion::End => serializer.serialize_i64(Self::END_WIRE_VALUE),
        }
    }
}

impl<'de> Deserialize<'de> for StreamVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        StreamVersion::from_wire(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stream version {}", value)))
    }
}

// =============================================================================
// Stream Message
// =============================================================================

/// A single message read from a stream.
///
/// Header fields are always populated. The JSON payload may be prefetched
/// by the engine (`json_data`) or loaded on demand with
/// [`StreamMessage::json_data`], which lets callers skip payload I/O when
/// the response will not carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub message_id: Uuid,
    pub stream_id: String,
    pub stream_version: u64,
    pub position: i64,
    pub created_utc: DateTime<Utc>,
    pub message_type: String,
    pub json_metadata: Option<String>,
    pub prefetched_json_data: Option<String>,
}

impl StreamMessage {
    /// `true` for the nil-id "no such version" sentinel.
    pub fn is_empty(&self) -> bool {
        self.message_id.is_nil()
    }

    /// Materialize the JSON payload, reading it from `store` when it was not
    /// prefetched.
    pub async fn json_data(
        &self,
        store: &dyn StreamStore,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if let Some(data) = &self.prefetched_json_data {
            return Ok(data.clone());
        }

        store
            .read_message_data(&self.stream_id, self.stream_version, cancel)
            .await?
            .ok_or_else(|| StoreError::MessageNotFound {
                stream_id: self.stream_id.clone(),
                stream_version: self.stream_version,
            })
    }
}

/// A message to append to a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStreamMessage {
    pub message_id: Uuid,
    pub message_type: String,
    pub json_data: String,
    pub json_metadata: Option<String>,
}

impl NewStreamMessage {
    pub fn new(
        message_id: Uuid,
        message_type: impl Into<String>,
        json_data: impl Into<String>,
    ) -> Self {
        Self {
            message_id,
            message_type: message_type.into(),
            json_data: json_data.into(),
            json_metadata: None,
        }
    }

    pub fn with_metadata(mut self, json_metadata: impl Into<String>) -> Self {
        self.json_metadata = Some(json_metadata.into());
        self
    }
}

/// Result of appending messages to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendResult {
    /// Version of the last message now in the stream
    pub current_version: u64,
    /// Global position of the last appended message
    pub current_position: i64,
}

/// Outcome of a delete-by-version request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing stored at that version; deletes are idempotent.
    NotFound,
}
