use crate::buf::SplitBytes;
use crate::protocol::{CompressionMethod, Method};
use memchr::memchr;
use std::str;

/// A single request header, borrowed from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'buf> {
    pub name: &'buf [u8],
    pub value: &'buf [u8],
}

/// Lazy iterator over the header lines of a request.
///
/// Lines are split at their first `:` and at most one space after the colon is
/// dropped. Lines without a colon, or with an empty name, are skipped.
#[derive(Debug, Clone)]
pub struct Headers<'buf> {
    lines: SplitBytes<'buf>,
}

impl<'buf> Headers<'buf> {
    /// Iterates over `block`, the header lines that follow the request line.
    pub(crate) fn new(block: &'buf [u8]) -> Self {
        Self { lines: SplitBytes::new(block, b'\n') }
    }
}

impl<'buf> Iterator for Headers<'buf> {
    type Item = Header<'buf>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let Some(idx) = memchr(b':', line) else {
                continue;
            };
            if idx == 0 {
                continue;
            }

            let value = &line[idx + 1..];
            let value = value.strip_prefix(b" ").unwrap_or(value);
            return Some(Header { name: &line[..idx], value });
        }
        None
    }
}

/// A parsed HTTP request.
///
/// Every byte field is a view into the buffer the request was parsed from, so
/// a `Request` can never outlive the pooled receive buffer backing it.
/// The only field written after parsing is the negotiated compression.
#[derive(Debug, Clone)]
pub struct Request<'buf> {
    method: Method,
    path: &'buf [u8],
    query: &'buf [u8],
    version: &'buf [u8],
    header_block: &'buf [u8],
    body: &'buf [u8],
    compression: CompressionMethod,
}

impl<'buf> Request<'buf> {
    pub(crate) fn new(
        method: Method,
        path: &'buf [u8],
        query: &'buf [u8],
        version: &'buf [u8],
        header_block: &'buf [u8],
        body: &'buf [u8],
    ) -> Self {
        Self { method, path, query, version, header_block, body, compression: CompressionMethod::NONE }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request target without its query string.
    pub fn path(&self) -> &'buf [u8] {
        self.path
    }

    /// The query string, without the leading `?`. Empty when absent.
    pub fn query(&self) -> &'buf [u8] {
        self.query
    }

    pub fn version(&self) -> &'buf [u8] {
        self.version
    }

    /// The headers in the order they were received.
    pub fn headers(&self) -> Headers<'buf> {
        Headers::new(self.header_block)
    }

    /// The body bytes; only attached for `POST`, `PUT` and `PATCH`.
    pub fn body(&self) -> &'buf [u8] {
        self.body
    }

    /// Looks up a header value by name, comparing bytes exactly.
    ///
    /// Clients that send lower-case names are only found through
    /// [`Request::header_ignore_case`].
    pub fn header(&self, name: &[u8]) -> Option<&'buf [u8]> {
        self.headers().find(|header| header.name == name).map(|header| header.value)
    }

    /// Looks up a header value by name, ignoring ASCII case.
    pub fn header_ignore_case(&self, name: &[u8]) -> Option<&'buf [u8]> {
        self.headers().find(|header| header.name.eq_ignore_ascii_case(name)).map(|header| header.value)
    }

    /// The `Content-Length` header parsed as a number.
    pub fn content_length(&self) -> Option<usize> {
        let value = self.header(b"Content-Length")?;
        str::from_utf8(value).ok()?.trim().parse().ok()
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    pub fn set_compression(&mut self, compression: CompressionMethod) {
        self.compression = compression;
    }
}
