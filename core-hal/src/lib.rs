//! # HAL Resource Layer
//!
//! Hypermedia (HAL+JSON) view of single stream messages.
//!
//! ## Overview
//!
//! - [`ReadStreamMessageOperation`] / [`DeleteStreamMessageOperation`] parse
//!   route parameters and run against a [`store_traits::StreamStore`]
//! - [`StreamMessageResource`] turns their results into [`Response`]s with
//!   caching headers and `_links`
//!
//! The resource produces status, headers and a JSON body; binding them to an
//! HTTP server is left to the host.

pub mod error;
pub mod headers;
pub mod links;
pub mod operations;
pub mod response;
pub mod stream_message;

pub use error::{HalError, Result};
pub use operations::{DeleteStreamMessageOperation, ReadOutcome, ReadStreamMessageOperation};
pub use response::{Method, Response};
pub use stream_message::StreamMessageResource;
