//! Header names and caching values used by the message resource.

pub const ETAG: &str = "ETag";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const LOCATION: &str = "Location";

/// A message at a concrete version never changes.
pub const CACHE_CONTROL_ONE_YEAR: &str = "max-age=31536000, public, immutable";

/// Strong entity tag for the message at `stream_version`.
pub fn etag_from_stream_version(stream_version: u64) -> String {
    format!("\"{}\"", stream_version)
}
