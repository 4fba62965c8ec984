//! Conditional requests and `Cache-Control` rendering.
//!
//! A [`Cacheable`] describes how a piece of content may be cached. [`is_stale`]
//! decides whether the client's copy must be replaced, and
//! [`append_cache_headers`] writes the matching response headers.

use quill_http::codec::{ResponseBuilder, SERVER_NAME, is_http_date};
use quill_http::protocol::{Request, StatusCode};
use std::str;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::trace;

const NO_CACHE: &[u8] = b"must-understand, no-store, no-cache, max-age=0, must-revalidate, proxy-revalidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    /// The response must not be cached at all.
    NoCache,
    /// Shared caches may store the response.
    Public,
    /// Only the user's own cache may store the response.
    Private,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    #[error("cacheable content requires a non-empty ETag")]
    MissingEtag,

    #[error("last modification time must lie between 1970 and the end of year 9999")]
    InvalidLastModified,
}

/// Caching rules for one piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cacheable<'a> {
    cache_type: CacheType,
    max_age: u64,
    etag: &'a [u8],
    vary: Option<&'a [u8]>,
    last_modified: Option<SystemTime>,
}

impl<'a> Cacheable<'a> {
    /// `max_age` is in seconds. `etag` is written as is, so it should already
    /// be quoted, like `"v1"`.
    pub fn new(cache_type: CacheType, max_age: u64, etag: &'a [u8]) -> Result<Self, CacheError> {
        if cache_type != CacheType::NoCache && etag.is_empty() {
            return Err(CacheError::MissingEtag);
        }
        Ok(Self { cache_type, max_age, etag, vary: None, last_modified: None })
    }

    pub fn no_cache() -> Self {
        Self { cache_type: CacheType::NoCache, max_age: 0, etag: &[], vary: None, last_modified: None }
    }

    pub fn public(max_age: u64, etag: &'a [u8]) -> Result<Self, CacheError> {
        Self::new(CacheType::Public, max_age, etag)
    }

    pub fn private(max_age: u64, etag: &'a [u8]) -> Result<Self, CacheError> {
        Self::new(CacheType::Private, max_age, etag)
    }

    /// Names the request headers that select between cached variants.
    #[must_use]
    pub fn with_vary(mut self, vary: &'a [u8]) -> Self {
        self.vary = Some(vary);
        self
    }

    /// Fails with [`CacheError::InvalidLastModified`] when `last_modified`
    /// cannot be written as an HTTP date.
    pub fn with_last_modified(mut self, last_modified: SystemTime) -> Result<Self, CacheError> {
        if !is_http_date(last_modified) {
            return Err(CacheError::InvalidLastModified);
        }
        self.last_modified = Some(last_modified);
        Ok(self)
    }

    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn etag(&self) -> &'a [u8] {
        self.etag
    }

    pub fn vary(&self) -> Option<&'a [u8]> {
        self.vary
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}

/// Whether the client has to receive the content again.
///
/// `If-None-Match` takes precedence over `If-Modified-Since`. When neither
/// proves the client's copy current, the content is stale.
pub fn is_stale(request: &Request<'_>, cacheable: &Cacheable<'_>) -> bool {
    if cacheable.cache_type == CacheType::NoCache {
        return true;
    }

    if let Some(etag) = request.header(b"If-None-Match") {
        return etag != cacheable.etag;
    }

    let since = request.header(b"If-Modified-Since").and_then(|value| {
        let value = str::from_utf8(value).ok()?;
        httpdate::parse_http_date(value).inspect_err(|e| trace!(cause = %e, "unparseable If-Modified-Since")).ok()
    });

    match (cacheable.last_modified, since) {
        (Some(last_modified), Some(since)) => unix_seconds(last_modified) > unix_seconds(since),
        _ => true,
    }
}

/// HTTP dates carry whole seconds, so sub-second precision is dropped before comparing.
fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}

/// Writes `Cache-Control`, and for cacheable content `ETag`, `Vary`, `Date`
/// and `Last-Modified`.
pub fn append_cache_headers(response: &mut ResponseBuilder, cacheable: &Cacheable<'_>) {
    response.append(b"Cache-Control: ");
    match cacheable.cache_type {
        CacheType::NoCache => {
            response.append(NO_CACHE);
            response.append_line_end();
            return;
        }
        CacheType::Public => response.append(b"public"),
        CacheType::Private => response.append(b"private"),
    }
    response.append(b", must-revalidate, max-age=");
    response.append_number(cacheable.max_age);
    response.append_line_end();

    response.append_header(b"ETag", cacheable.etag);

    if let Some(vary) = cacheable.vary {
        response.append_header(b"Vary", vary);
    }

    if let Some(last_modified) = cacheable.last_modified {
        response.append(b"Date: ");
        response.append_http_date(SystemTime::now());
        response.append_line_end();

        response.append(b"Last-Modified: ");
        response.append_http_date(last_modified);
        response.append_line_end();
    }
}

/// Writes a complete `304 Not Modified` response for `cacheable`.
pub fn append_not_modified(response: &mut ResponseBuilder, request: &Request<'_>, cacheable: &Cacheable<'_>) {
    response.append_status_line(request.version(), StatusCode::NOT_MODIFIED);
    if cacheable.last_modified.is_none() {
        response.append(b"Date: ");
        response.append_http_date(SystemTime::now());
        response.append_line_end();
    }
    response.append_header(b"Server", SERVER_NAME);
    append_cache_headers(response, cacheable);
    response.append_line_end();
    response.start_content();
}
