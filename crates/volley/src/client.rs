//! The batching client: staging surface plus dispatch entry point.
//!
//! [`BatchClient`] owns the base address, the caller-supplied transport,
//! the concurrency ceiling, and the admission queue. Usage is two-phase:
//! stage work with [`BatchClient::enqueue`] (as many times as needed, from
//! as many sub-routines as needed), then run everything staged with one
//! [`BatchClient::dispatch`] call. Staged-but-not-dispatched entries are
//! the only state that survives between dispatch calls.

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::dispatch::run_batch;
use crate::error::Result;
use crate::queue::AdmissionQueue;
use crate::request::{self, Request, Scope};
use crate::sink::Sink;
use crate::transport::Transport;

/// In-flight ceiling used when the caller does not override it.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Concurrent request-batching client bound to one remote base address.
pub struct BatchClient<T> {
    base: Url,
    transport: T,
    concurrency: usize,
    queue: AdmissionQueue,
}

impl<T> std::fmt::Debug for BatchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchClient")
            .field("base", &self.base)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> BatchClient<T> {
    /// Creates a client for `base` using the supplied transport and the
    /// default concurrency ceiling.
    ///
    /// # Errors
    ///
    /// Returns a construction error when `base` is not a valid absolute
    /// URL.
    pub fn new(base: &str, transport: T) -> Result<Self> {
        let base = Url::parse(base)?;
        Ok(Self {
            base,
            transport,
            concurrency: DEFAULT_CONCURRENCY,
            queue: AdmissionQueue::default(),
        })
    }

    /// Overrides the in-flight ceiling. Values below 1 are clamped to 1.
    /// The ceiling is fixed for the client's lifetime.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Number of entries currently staged.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Builds a request against this client's base address, decorated from
    /// `scope`. Pure construction; see [`Request`] for the dedup identity
    /// the result carries.
    ///
    /// # Errors
    ///
    /// Construction errors only: unjoinable path, unserializable body, or
    /// decoration that is not a valid header value.
    pub fn request<B>(
        &self,
        scope: &Scope,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Request>
    where
        B: Serialize + ?Sized,
    {
        request::build(&self.base, scope, method, path, query, body)
    }

    /// Stages `request` under `key`, binding `sink` as its destination.
    ///
    /// Returns `false`, performing no mutation, when the key is
    /// already staged, or when the request is a read whose normalized
    /// target matches an already-staged read. A rejected enqueue never
    /// rebinds the original entry's destination.
    pub fn enqueue<D>(&mut self, key: &str, request: Request, sink: &Sink<D>) -> bool
    where
        D: DeserializeOwned + Send + 'static,
    {
        self.queue.insert(key, request, sink.writer())
    }

    /// Executes every currently staged entry, at most the configured
    /// ceiling in flight at once, and drains the queue.
    ///
    /// Returns after every entry has been attempted. An empty queue is a
    /// no-op. On failure the *first* failure observed is returned; the
    /// remaining entries still run to completion, and their outcomes are
    /// observable through their sinks.
    ///
    /// # Errors
    ///
    /// The first transport, status, decode, or cancellation failure of the
    /// batch.
    pub async fn dispatch(&mut self, scope: &Scope) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }

        let entries = self.queue.drain();
        match run_batch(entries, &self.transport, self.concurrency, &scope.cancel).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::{BoxError, Response};

    /// A transport that must never be reached.
    struct UnreachableTransport;

    impl Transport for UnreachableTransport {
        async fn send(&self, request: Request) -> Result<Response, BoxError> {
            unreachable!("no round trip expected for {}", request.url);
        }
    }

    #[test]
    fn rejects_invalid_base_address() {
        let err = BatchClient::new("not a url", UnreachableTransport).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn concurrency_is_clamped_to_at_least_one() {
        let client = BatchClient::new("http://cases.test", UnreachableTransport)
            .unwrap()
            .with_concurrency(0);
        assert_eq!(client.concurrency, 1);
    }

    #[test]
    fn staging_is_reflected_in_pending() {
        let scope = Scope::new();
        let mut client = BatchClient::new("http://cases.test", UnreachableTransport).unwrap();
        let req = client
            .request(&scope, Method::GET, "/a", &[], None::<&()>)
            .unwrap();
        assert!(client.enqueue("a", req, &Sink::<serde_json::Value>::new()));
        assert_eq!(client.pending(), 1);
    }

    #[tokio::test]
    async fn dispatch_on_empty_queue_is_a_noop() {
        let mut client = BatchClient::new("http://cases.test", UnreachableTransport).unwrap();
        client.dispatch(&Scope::new()).await.unwrap();
    }
}
