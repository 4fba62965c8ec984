//! Zero-copy request parsing.
//!
//! [`RequestParser`] turns the bytes of one HTTP/1.1 request into a
//! [`Request`] whose fields all point back into the input. Nothing is copied
//! and nothing is decoded eagerly: the query string, the body framing and
//! header values are left for the layers that need them.
//!
//! # Parsing rules
//!
//! - The message is split at the first blank line. Without one the whole buffer
//!   is treated as the header block and the body is empty.
//! - The first line must split on single spaces into exactly three non-empty
//!   tokens: method, target and version.
//! - Unknown method tokens parse to [`Method::None`] rather than failing.
//! - Every other line is a header, split lazily by [`Headers`] when looked up.
//! - The body is only attached for `POST`, `PUT` and `PATCH`.
//!
//! # Limits
//!
//! Headers are counted while parsing, never collected: a request with more than
//! `max_headers` of them (default [`DEFAULT_MAX_HEADERS`]) fails with
//! [`ParseError::TooManyHeaders`].

use crate::buf::SplitBytes;
use crate::ensure;
use crate::protocol::{Headers, Method, ParseError, Request};
use memchr::memchr;
use memchr::memmem;
use tracing::trace;

/// Default upper bound on the number of request headers.
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Which blank line terminates the header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n\r\n`, as the protocol mandates.
    #[default]
    CrLf,
    /// `\n\n`, for lenient peers and hand-written fixtures.
    Lf,
}

impl LineEnding {
    pub fn head_terminator(self) -> &'static [u8] {
        match self {
            Self::CrLf => b"\r\n\r\n",
            Self::Lf => b"\n\n",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequestParser {
    line_ending: LineEnding,
    max_headers: usize,
}

impl RequestParser {
    pub fn new() -> Self {
        Self { line_ending: LineEnding::CrLf, max_headers: DEFAULT_MAX_HEADERS }
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    /// Returns the offset where the body starts, if the header block is complete.
    pub fn body_offset(&self, buf: &[u8]) -> Option<usize> {
        let terminator = self.line_ending.head_terminator();
        memmem::find(buf, terminator).map(|idx| idx + terminator.len())
    }

    /// Parses one request out of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyRequest`] for an empty buffer,
    /// [`ParseError::InvalidRequestLine`] when the first line does not hold a
    /// method, a target and a version, and [`ParseError::TooManyHeaders`] when
    /// the header limit is exceeded. No partial request is ever returned.
    pub fn parse<'buf>(&self, buf: &'buf [u8]) -> Result<Request<'buf>, ParseError> {
        ensure!(!buf.is_empty(), ParseError::EmptyRequest);

        let terminator_len = self.line_ending.head_terminator().len();
        let (head, body): (&[u8], &[u8]) = match self.body_offset(buf) {
            Some(offset) => (&buf[..offset - terminator_len], &buf[offset..]),
            None => (buf, &[]),
        };

        let mut lines = SplitBytes::new(head, b'\n');

        let request_line = lines.next().map(trim_cr).ok_or(ParseError::EmptyRequest)?;
        let (method, target, version) = parse_request_line(request_line)?;
        let header_block = lines.remainder();

        let (path, query) = match memchr(b'?', target) {
            Some(idx) => (&target[..idx], &target[idx + 1..]),
            None => (target, &target[target.len()..]),
        };

        ensure!(Headers::new(header_block).nth(self.max_headers).is_none(), ParseError::too_many_headers(self.max_headers));

        let body = if method.has_body() { body } else { &body[..0] };

        trace!(%method, body = body.len(), "parsed request");
        Ok(Request::new(method, path, query, version, header_block, body))
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_request_line(line: &[u8]) -> Result<(Method, &[u8], &[u8]), ParseError> {
    let mut tokens = SplitBytes::new(line, b' ');

    let method = tokens.next().filter(|token| !token.is_empty());
    let target = tokens.next().filter(|token| !token.is_empty());
    let version = tokens.next().filter(|token| !token.is_empty());

    match (method, target, version, tokens.next()) {
        (Some(method), Some(target), Some(version), None) => Ok((Method::from_bytes(method), target, version)),
        _ => Err(ParseError::invalid_request_line(String::from_utf8_lossy(line))),
    }
}
