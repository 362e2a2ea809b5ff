//! Protocol-neutral HTTP response produced by the resources.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

pub const OK: u16 = 200;
pub const TEMPORARY_REDIRECT: u16 = 307;
pub const NOT_FOUND: u16 = 404;

/// Response handed to the routing layer for serialization.
///
/// Header names are stored as given; lookups through [`Response::header`]
/// ignore ASCII case.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: Value) -> Self {
        Self::new(OK, body)
    }

    /// Response whose body is an empty JSON object.
    pub fn empty(status: u16) -> Self {
        Self::new(status, Value::Object(Map::new()))
    }

    /// Append a value to header `name`.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Methods a resource can advertise through `Allow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
