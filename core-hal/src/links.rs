//! HAL `_links` for the message resource.
//!
//! Hrefs are relative to the resource and rooted at [`ROOT`], so a message
//! served at `streams/{id}/{version}` links back to the store index with
//! `../../`.

use serde::Serialize;
use serde_json::{Map, Value};
use store_traits::StreamVersion;

pub const ROOT: &str = "../../";

pub mod rel {
    pub const SELF: &str = "self";
    pub const FIRST: &str = "first";
    pub const PREVIOUS: &str = "previous";
    pub const NEXT: &str = "next";
    pub const LAST: &str = "last";
    pub const INDEX: &str = "index";
    pub const FEED: &str = "streamStore:feed";
    pub const FIND: &str = "streamStore:find";
    pub const DELETE_MESSAGE: &str = "streamStore:delete-message";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Ordered set of link relations sharing one root.
#[derive(Debug, Clone, Default)]
pub struct Links {
    root: String,
    entries: Vec<(String, Link)>,
}

impl Links {
    pub fn rooted_at(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    pub fn add(self, rel: &str, href: &str) -> Self {
        self.push(rel, href, false, None)
    }

    pub fn add_titled(self, rel: &str, href: &str, title: &str) -> Self {
        self.push(rel, href, false, Some(title.to_string()))
    }

    pub fn add_templated(self, rel: &str, href: &str) -> Self {
        self.push(rel, href, true, None)
    }

    fn push(mut self, rel: &str, href: &str, templated: bool, title: Option<String>) -> Self {
        self.entries.push((
            rel.to_string(),
            Link {
                href: format!("{}{}", self.root, href),
                templated,
                title,
            },
        ));
        self
    }

    /// Link to the store root.
    pub fn index(self) -> Self {
        self.add_titled(rel::INDEX, "", "Index")
    }

    /// Templated link for locating a stream by id.
    pub fn find(self) -> Self {
        self.add_templated(rel::FIND, "streams/{streamId}")
    }

    /// Paging links around a message.
    ///
    /// `version` is the version the links are built for: the resolved
    /// version when the message was found, the requested one otherwise.
    pub fn navigation(self, stream_id: &str, version: StreamVersion) -> Self {
        let stream = format!("streams/{}", stream_id);
        let at = |v: StreamVersion| format!("{}/{}", stream, v);

        let mut links = self.add(rel::FIRST, &at(StreamVersion::Concrete(0)));

        if let StreamVersion::Concrete(v) = version {
            if v > 0 {
                links = links.add(rel::PREVIOUS, &at(StreamVersion::Concrete(v - 1)));
            }
            if let Some(next) = v.checked_add(1) {
                links = links.add(rel::NEXT, &at(StreamVersion::Concrete(next)));
            }
        }

        links
            .add(rel::LAST, &at(StreamVersion::End))
            .add(rel::FEED, &stream)
            .add(rel::SELF, &at(version))
    }

    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.entries
            .iter()
            .find(|(name, _)| name == rel)
            .map(|(_, link)| link)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (rel, link) in &self.entries {
            map.insert(
                rel.clone(),
                serde_json::to_value(link).unwrap_or(Value::Null),
            );
        }
        Value::Object(map)
    }
}
