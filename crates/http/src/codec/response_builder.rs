//! The response buffer handlers write into.
//!
//! [`ResponseBuilder`] is an append-only byte buffer on top of a [`PooledBuf`].
//! Handlers write the status line and headers, call
//! [`start_content`](ResponseBuilder::start_content) once, then write the body.
//! The recorded boundary lets the server send the header block as-is and
//! compress only the content region.
//!
//! When an append does not fit, a larger array is rented from the same pool,
//! the written bytes are copied to the same offsets, and the old array goes back
//! to the pool.

use crate::buf::{BufferPool, PooledBuf};
use crate::codec::DateService;
use crate::protocol::{CompressionMethod, Request, StatusCode};
use httpdate::HttpDate;
use std::fmt;
use std::io::{self, Cursor, Write};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Initial capacity of a builder created with [`ResponseBuilder::new`].
pub const DEFAULT_RESPONSE_CAPACITY: usize = 1024;

/// Value of the `Server` header.
pub const SERVER_NAME: &[u8] = b"quill";

/// Length of an IMF-fixdate such as `Sun, 06 Nov 1994 08:49:37 GMT`.
const HTTP_DATE_LEN: usize = 29;

/// `Fri, 31 Dec 9999 23:59:59 GMT`, the last instant an IMF-fixdate can express.
const LATEST_HTTP_DATE_SECS: u64 = 253_402_300_799;

/// Whether `time` falls between 1970 and the end of year 9999, the range an
/// IMF-fixdate can express.
pub fn is_http_date(time: SystemTime) -> bool {
    time.duration_since(UNIX_EPOCH).is_ok_and(|elapsed| elapsed.as_secs() <= LATEST_HTTP_DATE_SECS)
}

pub struct ResponseBuilder {
    buf: PooledBuf,
    position: usize,
    taken: usize,
    content_start: Option<usize>,
    content_encoding: CompressionMethod,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RESPONSE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_pool(&BufferPool::shared(), capacity)
    }

    pub fn with_pool(pool: &Arc<BufferPool>, capacity: usize) -> Self {
        Self {
            buf: pool.rent(capacity),
            position: 0,
            taken: 0,
            content_start: None,
            content_encoding: CompressionMethod::NONE,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.position]
    }

    /// Where the content region starts, if [`start_content`](Self::start_content) was called.
    pub fn content_start(&self) -> Option<usize> {
        self.content_start
    }

    /// The header block; everything written so far when content was never started.
    pub fn headers(&self) -> &[u8] {
        &self.buf[..self.content_start.unwrap_or(self.position)]
    }

    /// The content region; empty when content was never started.
    pub fn content(&self) -> &[u8] {
        match self.content_start {
            Some(start) => &self.buf[start..self.position],
            None => &[],
        }
    }

    /// The coding announced by a `Content-Encoding` header written through
    /// [`append_content_encoding`](Self::append_content_encoding).
    pub fn content_encoding(&self) -> CompressionMethod {
        self.content_encoding
    }

    /// Marks the end of the header block. Later calls are ignored.
    pub fn start_content(&mut self) {
        if self.content_start.is_none() {
            self.content_start = Some(self.position);
        }
    }

    /// Drops everything after `len`. Truncating into the header block also
    /// forgets the content marker.
    pub fn truncate(&mut self, len: usize) {
        self.position = self.position.min(len);
        self.taken = 0;
        if self.content_start.is_some_and(|start| start > self.position) {
            self.content_start = None;
            self.content_encoding = CompressionMethod::NONE;
        }
    }

    /// Discards the whole response, keeping the backing array.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    fn reserve(&mut self, additional: usize) {
        if self.position + additional <= self.buf.len() {
            return;
        }

        // doubling keeps repeated small appends amortized past the largest pool class
        let mut next = self.buf.pool().rent((self.buf.len() * 2).max(self.position + additional));
        next[..self.position].copy_from_slice(&self.buf[..self.position]);
        trace!(from = self.buf.len(), to = next.len(), "response buffer grown");
        // the previous array is returned to the pool here
        self.buf = next;
    }

    /// Returns at least `len` writable bytes at the cursor.
    ///
    /// Pair with [`advance`](Self::advance) to commit what was actually written.
    pub fn take(&mut self, len: usize) -> &mut [u8] {
        self.reserve(len);
        self.taken = len;
        &mut self.buf[self.position..self.position + len]
    }

    /// Commits `written` bytes of the span returned by the last [`take`](Self::take).
    ///
    /// # Panics
    ///
    /// Panics when `written` exceeds what was taken.
    pub fn advance(&mut self, written: usize) {
        assert!(written <= self.taken, "advanced {written} bytes but only {} were taken", self.taken);
        self.position += written;
        self.taken = 0;
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buf[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    pub fn append_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.buf[self.position] = byte;
        self.position += 1;
    }

    /// Appends the UTF-8 encoding of `c`.
    pub fn append_char(&mut self, c: char) {
        let mut encoded = [0u8; 4];
        self.append(c.encode_utf8(&mut encoded).as_bytes());
    }

    pub fn append_str(&mut self, str: &str) {
        self.append(str.as_bytes());
    }

    /// Formats `number` straight into the free tail of the buffer.
    ///
    /// # Panics
    ///
    /// Formatting cannot run out of room after the capacity pre-check; if it
    /// does, the builder panics instead of writing a truncated number.
    pub fn append_number<N: Number>(&mut self, number: N) {
        self.append_display(N::MAX_LEN, number);
    }

    /// Formats `time` as an IMF-fixdate. Times outside the range checked by
    /// [`is_http_date`] are clamped to its nearest end.
    pub fn append_http_date(&mut self, time: SystemTime) {
        let latest = UNIX_EPOCH + Duration::from_secs(LATEST_HTTP_DATE_SECS);
        self.append_display(HTTP_DATE_LEN, HttpDate::from(time.clamp(UNIX_EPOCH, latest)));
    }

    fn append_display<D: fmt::Display>(&mut self, max_len: usize, value: D) {
        let written = {
            let mut cursor = Cursor::new(self.take(max_len));
            if let Err(e) = write!(cursor, "{value}") {
                panic!("formatted value exceeded its reserved {max_len} bytes: {e}");
            }
            cursor.position()
        };
        self.advance(usize::try_from(written).unwrap_or(max_len));
    }

    pub fn append_line_end(&mut self) {
        self.append(b"\r\n");
    }

    /// Writes `<version> <code> <reason>\r\n`.
    pub fn append_status_line(&mut self, version: &[u8], status: StatusCode) {
        self.append(version);
        self.append_byte(b' ');
        self.append_str(status.as_str());
        self.append_byte(b' ');
        self.append_str(status.canonical_reason().unwrap_or(""));
        self.append_line_end();
    }

    /// Writes `<name>: <value>\r\n`.
    pub fn append_header(&mut self, name: &[u8], value: &[u8]) {
        self.append(name);
        self.append(b": ");
        self.append(value);
        self.append_line_end();
    }

    pub fn append_content_length(&mut self, length: usize) {
        self.append(b"Content-Length: ");
        self.append_number(length);
        self.append_line_end();
    }

    /// Writes a `Content-Encoding` header for a single codec and remembers it, so
    /// the server compresses the content region before sending.
    pub fn append_content_encoding(&mut self, method: CompressionMethod) {
        if let Some(token) = method.token() {
            self.append_header(b"Content-Encoding", token.as_bytes());
            self.content_encoding = method;
        }
    }

    /// Writes the standard header block and starts the content.
    ///
    /// Emits the status line (echoing the request's version), `Date`, `Server`,
    /// `Content-Type` when given, `Content-Length` unless the request negotiated
    /// a compression method, `Content-Encoding` when it did, and the blank line.
    pub fn append_headers(
        &mut self,
        request: &Request<'_>,
        status: StatusCode,
        content_type: Option<&[u8]>,
        content_length: usize,
    ) {
        self.append_status_line(request.version(), status);
        DateService::global().with_http_date(|date| self.append_header(b"Date", date));
        self.append_header(b"Server", SERVER_NAME);

        if let Some(content_type) = content_type {
            self.append_header(b"Content-Type", content_type);
        }

        let compression = request.compression();
        if compression.is_single() {
            self.append_content_encoding(compression);
        } else {
            self.append_content_length(content_length);
        }

        self.append_line_end();
        self.start_content();
    }

    /// Writes a complete response with `content` as its body.
    pub fn append_response(&mut self, request: &Request<'_>, status: StatusCode, content_type: Option<&[u8]>, content: &[u8]) {
        self.append_headers(request, status, content_type, content.len());
        self.append(content);
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResponseBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("len", &self.position)
            .field("capacity", &self.buf.len())
            .field("content_start", &self.content_start)
            .field("content_encoding", &self.content_encoding)
            .finish()
    }
}

impl Write for ResponseBuilder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive numbers [`ResponseBuilder::append_number`] can format.
pub trait Number: fmt::Display + Copy + sealed::Sealed {
    /// Upper bound on the length of the decimal representation.
    const MAX_LEN: usize;
}

macro_rules! impl_number {
    ($($ty:ty => $max_len:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Number for $ty {
                const MAX_LEN: usize = $max_len;
            }
        )*
    };
}

impl_number!(
    u8 => 3, i8 => 4,
    u16 => 5, i16 => 6,
    u32 => 10, i32 => 11,
    u64 => 20, i64 => 20,
    u128 => 39, i128 => 40,
    usize => 20, isize => 20,
    // full decimal expansion of the smallest subnormal
    f32 => 64, f64 => 400,
);
