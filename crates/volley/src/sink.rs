//! Caller-owned typed destinations for decoded responses.
//!
//! A [`Sink<T>`] is the location a successful response is decoded into. The
//! caller keeps the handle; the enqueue site binds it into a type-erased
//! write-once decoder so the admission queue can hold entries of different
//! shapes. The dispatcher writes at most one value, only on success, and
//! never after the batch has completed. A sink that is still empty after
//! `dispatch` returns means its entry failed or was never admitted.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

/// Type-erased decoder bound to one queued entry. Consumes the entry's
/// single write permission.
pub(crate) type ResponseWriter = Box<dyn FnOnce(&Bytes) -> Result<(), serde_json::Error> + Send>;

/// A shared, write-once slot for one decoded response.
pub struct Sink<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Sink<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a value has been decoded into this sink.
    pub fn is_filled(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Removes and returns the decoded value, leaving the sink empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}

impl<T: Clone> Sink<T> {
    /// Returns a copy of the decoded value without consuming it.
    pub fn peek(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

impl<T> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: cloning the handle shares the slot and must not require
// `T: Clone`.
impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Sink<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Bridges this sink into the type-erased writer stored on a queued
    /// entry. Decode success stores exactly one value; decode failure
    /// leaves the sink untouched.
    pub(crate) fn writer(&self) -> ResponseWriter {
        let slot = Arc::clone(&self.slot);
        Box::new(move |body: &Bytes| {
            let value: T = serde_json::from_slice(body)?;
            *slot.lock() = Some(value);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let sink: Sink<u32> = Sink::new();
        assert!(!sink.is_filled());
        assert!(sink.take().is_none());
    }

    #[test]
    fn writer_fills_the_shared_slot() {
        let sink: Sink<Vec<u32>> = Sink::new();
        let writer = sink.writer();
        writer(&Bytes::from_static(b"[1,2,3]")).unwrap();
        assert!(sink.is_filled());
        assert_eq!(sink.take(), Some(vec![1, 2, 3]));
        assert!(!sink.is_filled());
    }

    #[test]
    fn decode_failure_leaves_sink_untouched() {
        let sink: Sink<u32> = Sink::new();
        let writer = sink.writer();
        assert!(writer(&Bytes::from_static(b"not json")).is_err());
        assert!(!sink.is_filled());
    }

    #[test]
    fn peek_does_not_consume() {
        let sink: Sink<String> = Sink::new();
        let writer = sink.writer();
        writer(&Bytes::from_static(b"\"done\"")).unwrap();
        assert_eq!(sink.peek().as_deref(), Some("done"));
        assert_eq!(sink.take().as_deref(), Some("done"));
    }
}
