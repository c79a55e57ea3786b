//! Batch execution under a bounded in-flight ceiling.
//!
//! The dispatcher takes the drained contents of the admission queue and
//! runs every entry to completion, at most `limit` concurrently, in no
//! guaranteed order. Each entry is attempted exactly once: cancellation
//! pre-check, transport round trip, status check, decode into the entry's
//! destination. One entry failing does not stop the others; only the first
//! failure observed (in completion order) is reported to the caller.

use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::queue::QueuedRequest;
use crate::transport::Transport;

/// Runs every entry and returns the first failure observed, if any.
pub(crate) async fn run_batch<T>(
    entries: Vec<QueuedRequest>,
    transport: &T,
    limit: usize,
    cancel: &CancellationToken,
) -> Option<Error>
where
    T: Transport,
{
    let total = entries.len();
    tracing::debug!(total, limit, "dispatching batch");

    let mut outcomes = stream::iter(
        entries
            .into_iter()
            .map(|entry| execute(entry, transport, cancel)),
    )
    .buffer_unordered(limit.max(1));

    let mut first_failure: Option<Error> = None;
    while let Some(outcome) = outcomes.next().await {
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "batch entry failed");
            if first_failure.is_none() {
                first_failure = Some(err);
            }
        }
    }

    tracing::debug!(total, ok = first_failure.is_none(), "batch complete");
    first_failure
}

/// Attempts one entry. The entry's single write permission is consumed
/// here: the destination is written only when the round trip succeeded and
/// the body decoded.
async fn execute<T>(entry: QueuedRequest, transport: &T, cancel: &CancellationToken) -> Result<()>
where
    T: Transport,
{
    let QueuedRequest {
        key,
        request,
        writer,
        ..
    } = entry;
    let method = request.method.clone();
    let url = request.url.clone();

    // Entries that have not started when the scope is cancelled fail fast.
    // Entries already in flight are left to the transport, which may or may
    // not respect the scope.
    if cancel.is_cancelled() {
        return Err(Error::Cancelled { method, url });
    }

    tracing::trace!(%key, %url, "sending");
    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(source) => {
            return Err(Error::Transport {
                method,
                url,
                source,
            });
        }
    };

    if !response.status.is_success() {
        return Err(Error::Status {
            method,
            url,
            status: response.status,
        });
    }

    writer(&response.body).map_err(|source| Error::Decode {
        method,
        url,
        source,
    })
}
