#![doc = include_str!("../README.md")]

mod cache;
mod client;
mod dispatch;
mod error;
mod queue;
mod request;
mod sink;
mod transport;

pub use crate::cache::*;
pub use crate::client::*;
pub use crate::error::*;
pub use crate::request::*;
pub use crate::sink::*;
pub use crate::transport::*;

// Vocabulary types callers need to stage requests and script transports.
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;
