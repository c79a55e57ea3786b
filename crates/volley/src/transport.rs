//! The single-round-trip send capability the dispatcher depends on.
//!
//! [`Transport`] performs exactly one request/response exchange. The
//! dispatcher never constructs one and never depends on a concrete HTTP
//! client, so deterministic tests can script a double without a live
//! network. Production code uses [`ReqwestTransport`] behind the default-on
//! `reqwest` feature.

use std::future::Future;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::request::Request;

/// Boxed error for transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An HTTP response captured as plain owned data.
///
/// Status interpretation belongs to the dispatcher: a transport returns
/// non-success responses as data, never as `Err`.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Capability to perform one HTTP round trip.
///
/// `Err` means the round trip itself could not complete (connection refused,
/// timeout, protocol violation). A completed exchange is always `Ok`,
/// whatever its status code.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, BoxError>> + Send;
}

/// Production [`Transport`] backed by a shared [`reqwest::Client`].
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Wraps an already-configured client (proxies, pools, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, BoxError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
