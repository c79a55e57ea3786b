//! Admission queue: the staged, not-yet-executed portion of a batch.
//!
//! Entries are keyed by a caller-chosen identifier, unique within the
//! queue. Admission enforces the dedup rules: a repeated key is rejected
//! outright, and a read whose normalized target matches an already-staged
//! read is rejected under any key, so call sites composing a batch from
//! independent sub-routines never issue the same lookup twice. Writes that
//! happen to share a target are all admitted: two distinct postings to the
//! same path are different operations.
//!
//! Staging is single-threaded by construction (`&mut self`); one batch at a
//! time is the intended discipline.

use std::collections::HashMap;

use crate::request::Request;
use crate::sink::ResponseWriter;

/// One staged unit of outbound work awaiting dispatch.
pub(crate) struct QueuedRequest {
    pub key: String,
    pub request: Request,
    pub target: String,
    pub writer: ResponseWriter,
}

#[derive(Default)]
pub(crate) struct AdmissionQueue {
    entries: HashMap<String, QueuedRequest>,
}

impl AdmissionQueue {
    /// Stages an entry. Returns `false`, mutating nothing, when the key is
    /// already present or when `request` is a read whose normalized target
    /// matches an already-staged read.
    pub fn insert(&mut self, key: &str, request: Request, writer: ResponseWriter) -> bool {
        if self.entries.contains_key(key) {
            tracing::debug!(%key, "enqueue rejected: key already staged");
            return false;
        }

        let target = request.normalized_target();
        if request.is_read()
            && self
                .entries
                .values()
                .any(|entry| entry.request.is_read() && entry.target == target)
        {
            tracing::debug!(%key, path = %target, "enqueue rejected: read already staged");
            return false;
        }

        self.entries.insert(
            key.to_string(),
            QueuedRequest {
                key: key.to_string(),
                request,
                target,
                writer,
            },
        );
        true
    }

    /// Removes and returns every staged entry, in no particular order.
    pub fn drain(&mut self) -> Vec<QueuedRequest> {
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use url::Url;

    use super::*;
    use crate::sink::Sink;

    fn request(method: Method, target: &str) -> Request {
        Request {
            method,
            url: Url::parse("http://cases.test")
                .unwrap()
                .join(target)
                .unwrap(),
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    fn writer() -> ResponseWriter {
        Sink::<serde_json::Value>::new().writer()
    }

    #[test]
    fn repeated_key_is_rejected_and_original_retained() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("bar", request(Method::GET, "/hello"), writer()));
        assert!(!queue.insert("bar", request(Method::GET, "/goodbye"), writer()));

        assert_eq!(queue.len(), 1);
        let entries = queue.drain();
        assert_eq!(entries[0].request.url.path(), "/hello");
    }

    #[test]
    fn identical_reads_are_coalesced_across_keys() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("a", request(Method::GET, "/x?page=1"), writer()));
        assert!(!queue.insert("b", request(Method::GET, "/x?page=1"), writer()));

        assert_eq!(queue.len(), 1);
        assert!(queue.contains_key("a"));
        assert!(!queue.contains_key("b"));
    }

    #[test]
    fn read_dedup_ignores_query_order() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("a", request(Method::GET, "/x?a=1&b=2"), writer()));
        assert!(!queue.insert("b", request(Method::GET, "/x?b=2&a=1"), writer()));
    }

    #[test]
    fn distinct_read_targets_are_both_admitted() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("a", request(Method::GET, "/x?page=1"), writer()));
        assert!(queue.insert("b", request(Method::GET, "/x?page=2"), writer()));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn writes_to_the_same_target_are_not_coalesced() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("pay-1", request(Method::POST, "/payments"), writer()));
        assert!(queue.insert("pay-2", request(Method::POST, "/payments"), writer()));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn a_write_does_not_block_a_read_on_the_same_target() {
        let mut queue = AdmissionQueue::default();
        assert!(queue.insert("post", request(Method::POST, "/cases"), writer()));
        assert!(queue.insert("get", request(Method::GET, "/cases"), writer()));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut queue = AdmissionQueue::default();
        queue.insert("a", request(Method::GET, "/a"), writer());
        queue.insert("b", request(Method::GET, "/b"), writer());

        assert_eq!(queue.drain().len(), 2);
        assert!(queue.is_empty());
        // A previously-used key is admissible again once drained.
        assert!(queue.insert("a", request(Method::GET, "/a"), writer()));
    }
}
