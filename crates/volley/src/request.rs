//! Outbound request construction.
//!
//! A [`Request`] is an immutable description of one remote operation, built
//! from caller intent (method, path, query mapping, optional body) plus the
//! per-batch [`Scope`] decoration. Construction is pure: no I/O happens
//! here, and the only failure mode is malformed input.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};

const XSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

/// Cancellation and decoration bundle shared by one batch.
///
/// The token bounds the lifetime of a `dispatch` call; the cookies and
/// anti-forgery token are opaque session material supplied by the caller and
/// applied to every request built under this scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub cancel: CancellationToken,
    pub cookies: Vec<(String, String)>,
    pub xsrf_token: Option<String>,
}

impl Scope {
    /// A fresh, un-cancelled scope with no decoration.
    pub fn new() -> Self {
        Self::with_cancel(CancellationToken::new())
    }

    /// A scope bound to an existing cancellation token, so one token can
    /// govern several batches (or be wired to a shutdown signal).
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            cookies: Vec::new(),
            xsrf_token: None,
        }
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn xsrf(mut self, token: impl Into<String>) -> Self {
        self.xsrf_token = Some(token.into());
        self
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable outbound request description, ready for a [`Transport`].
///
/// [`Transport`]: crate::Transport
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    /// Whether this request is a read for admission purposes.
    ///
    /// Reads are side-effect-free and safe to coalesce when they resolve to
    /// the same target; everything else is deduplicated by key only.
    pub fn is_read(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// The identity used for read dedup: path plus query pairs sorted and
    /// re-encoded, so `/x?a=1&b=2` and `/x?b=2&a=1` coalesce.
    pub fn normalized_target(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();

        let mut target = self.url.path().to_string();
        if !pairs.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            target.push('?');
            target.push_str(&query);
        }
        target
    }
}

/// Builds a fully-formed [`Request`] from caller intent.
///
/// `path` is joined against `base` (an absolute path replaces the base
/// path). Query parameters already present in `path` are merged with the
/// supplied mapping and re-encoded canonically. A body, when present, is
/// serialized to JSON and implies a `content-type: application/json`
/// header. Cookies and the anti-forgery token from `scope` are applied as
/// headers.
///
/// # Errors
///
/// Only construction errors: an unjoinable path, an unserializable body, or
/// decoration that is not a valid header value.
pub(crate) fn build<B>(
    base: &Url,
    scope: &Scope,
    method: Method,
    path: &str,
    query: &[(&str, &str)],
    body: Option<&B>,
) -> Result<Request>
where
    B: Serialize + ?Sized,
{
    let mut url = base.join(path)?;

    let existing: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &existing {
            pairs.append_pair(k, v);
        }
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }

    let mut headers = HeaderMap::new();
    if !scope.cookies.is_empty() {
        let cookie = scope
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(COOKIE, HeaderValue::from_str(&cookie)?);
    }
    if let Some(token) = &scope.xsrf_token {
        headers.insert(XSRF_HEADER, HeaderValue::from_str(token)?);
    }

    let body = match body {
        Some(payload) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            let bytes =
                serde_json::to_vec(payload).map_err(|source| Error::InvalidBody { source })?;
            Some(Bytes::from(bytes))
        }
        None => None,
    };

    Ok(Request {
        method,
        url,
        headers,
        body,
    })
}
