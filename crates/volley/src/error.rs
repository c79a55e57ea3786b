//! Error types for the batching client.
//!
//! This module defines the central `Error` enum, covering the two moments a
//! batch can go wrong: construction (malformed input, caught before any
//! I/O) and dispatch (transport failure, non-success status, undecodable
//! response, or a cancelled scope). Every dispatch-time variant carries the
//! method and resolved URL of the entry it belongs to, so callers can tell
//! an authorization failure on one endpoint apart from a validation failure
//! on another.

use http::{Method, StatusCode};
use url::Url;

use crate::transport::BoxError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for batch construction and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base address or path could not be parsed into a URL.
    #[error("invalid request target: {source}")]
    InvalidTarget {
        #[from]
        source: url::ParseError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("invalid request body: {source}")]
    InvalidBody { source: serde_json::Error },

    /// A cookie or token value was not a valid header value.
    #[error("invalid request decoration: {source}")]
    InvalidDecoration {
        #[from]
        source: http::header::InvalidHeaderValue,
    },

    /// The transport could not complete the round trip.
    #[error("{method} {url}: transport failed: {source}")]
    Transport {
        method: Method,
        url: Url,
        source: BoxError,
    },

    /// The server answered with a non-success status.
    #[error("{method} {url}: unexpected status {status}")]
    Status {
        method: Method,
        url: Url,
        status: StatusCode,
    },

    /// The response body did not match the destination's expected shape.
    #[error("{method} {url}: response decode failed: {source}")]
    Decode {
        method: Method,
        url: Url,
        source: serde_json::Error,
    },

    /// The batch scope was cancelled before this entry started.
    #[error("{method} {url}: cancelled before dispatch")]
    Cancelled { method: Method, url: Url },
}
