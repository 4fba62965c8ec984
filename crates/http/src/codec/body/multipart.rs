//! Parsing of `multipart/form-data` bodies
//! ([RFC 7578](https://www.rfc-editor.org/rfc/rfc7578)).
//!
//! The parser never copies: every [`FormDataItem`] is a set of views into the
//! request body. Only the part headers RFC 7578 allows are recognized:
//! `Content-Disposition`, `Content-Type` and `Content-Transfer-Encoding`.

use crate::buf::{SplitBytes, SplitSeq};
use crate::ensure;
use crate::protocol::{MultipartError, Request};
use crate::utils::{trim_quotes, trim_whitespace};
use memchr::memchr;
use memchr::memmem::{self, Finder};
use mime::Mime;
use std::str;

const FORM_DATA: &[u8] = b"multipart/form-data";
const DEFAULT_CONTENT_TYPE: &[u8] = b"text/plain";

/// A `multipart/form-data` body together with its boundary.
#[derive(Debug, Clone, Copy)]
pub struct Multipart<'a> {
    boundary: &'a [u8],
    body: &'a [u8],
}

impl<'a> Multipart<'a> {
    /// Reads the boundary from the request's `Content-Type` and wraps its body.
    pub fn from_request(request: &Request<'a>) -> Result<Self, MultipartError> {
        let content_type = request.header(b"Content-Type").ok_or(MultipartError::MissingContentType)?;
        Self::new(content_type, request.body())
    }

    pub fn new(content_type: &'a [u8], body: &'a [u8]) -> Result<Self, MultipartError> {
        ensure!(content_type.starts_with(FORM_DATA), MultipartError::NotMultipart);
        let boundary = extract_boundary(content_type).ok_or(MultipartError::MissingBoundary)?;
        Ok(Self { boundary, body })
    }

    pub fn boundary(&self) -> &'a [u8] {
        self.boundary
    }

    /// Returns the first item whose `name` parameter equals `name`.
    pub fn get(&self, name: &[u8]) -> Option<FormDataItem<'a>> {
        self.iter().find(|item| item.name() == name)
    }

    pub fn iter(&self) -> Parts<'a> {
        Parts { body: self.body, finder: Finder::new(self.boundary), pos: None, done: false }
    }
}

impl<'a> IntoIterator for &Multipart<'a> {
    type Item = FormDataItem<'a>;
    type IntoIter = Parts<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn extract_boundary(content_type: &[u8]) -> Option<&[u8]> {
    let idx = memmem::find(content_type, b"boundary=")?;
    let value = SplitBytes::new(&content_type[idx + b"boundary=".len()..], b';').next()?;
    let value = trim_quotes(trim_whitespace(value));
    (!value.is_empty()).then_some(value)
}

/// Iterator over the parts of a [`Multipart`] body, stopping at the closing
/// delimiter or at the first structurally broken part.
#[derive(Debug, Clone)]
pub struct Parts<'a> {
    body: &'a [u8],
    finder: Finder<'a>,
    /// Offset just past the last delimiter seen; `None` before the first one.
    pos: Option<usize>,
    done: bool,
}

impl<'a> Parts<'a> {
    /// Finds the next `--boundary` at or after `from`, returning where its dashes
    /// start and where the boundary ends.
    ///
    /// A delimiter opens the body or a line, and is followed by `--`, padding,
    /// a line break or the end of the body.
    fn find_delimiter(&self, mut from: usize) -> Option<(usize, usize)> {
        while from < self.body.len() {
            let idx = from + self.finder.find(&self.body[from..])?;
            let end = idx + self.finder.needle().len();
            if idx >= 2 && &self.body[idx - 2..idx] == b"--" && self.opens_line(idx - 2) && self.closes_delimiter(end) {
                return Some((idx - 2, end));
            }
            from = idx + 1;
        }
        None
    }

    fn opens_line(&self, dashes: usize) -> bool {
        dashes == 0 || self.body[dashes - 1] == b'\n'
    }

    fn closes_delimiter(&self, end: usize) -> bool {
        let rest = &self.body[end..];
        rest.is_empty() || rest.starts_with(b"--") || matches!(rest[0], b'\r' | b'\n' | b' ' | b'\t')
    }

    fn finish(&mut self) -> Option<FormDataItem<'a>> {
        self.done = true;
        None
    }
}

impl<'a> Iterator for Parts<'a> {
    type Item = FormDataItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut pos = match self.pos {
            Some(pos) => pos,
            None => match self.find_delimiter(0) {
                Some((_, end)) => end,
                None => return self.finish(),
            },
        };

        loop {
            let rest = &self.body[pos..];
            if rest.starts_with(b"--") {
                return self.finish();
            }

            let Some(line_end) = memchr(b'\n', rest) else {
                return self.finish();
            };
            let part_start = pos + line_end + 1;

            let Some((delimiter_start, delimiter_end)) = self.find_delimiter(part_start) else {
                return self.finish();
            };
            self.pos = Some(delimiter_end);
            pos = delimiter_end;

            let part = &self.body[part_start..delimiter_start.max(part_start)];
            let part = part.strip_suffix(b"\r\n").or_else(|| part.strip_suffix(b"\n")).unwrap_or(part);

            if let Some(item) = FormDataItem::parse(part) {
                return Some(item);
            }
        }
    }
}

/// One field or file of a form-data body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormDataItem<'a> {
    name: &'a [u8],
    filename: Option<&'a [u8]>,
    content_disposition: Option<&'a [u8]>,
    content_type: Option<&'a [u8]>,
    transfer_encoding: Option<&'a [u8]>,
    content: &'a [u8],
}

impl<'a> FormDataItem<'a> {
    fn parse(part: &'a [u8]) -> Option<Self> {
        let (head, content) = if let Some(content) = part.strip_prefix(b"\r\n") {
            (&part[..0], content)
        } else {
            let idx = memmem::find(part, b"\r\n\r\n")?;
            (&part[..idx], &part[idx + 4..])
        };

        let mut item = FormDataItem {
            name: &[],
            filename: None,
            content_disposition: None,
            content_type: None,
            transfer_encoding: None,
            content,
        };

        for line in SplitSeq::new(head, b"\r\n") {
            let Some(idx) = memchr(b':', line) else {
                continue;
            };
            let (name, value) = (&line[..idx], trim_whitespace(&line[idx + 1..]));

            if name.eq_ignore_ascii_case(b"Content-Disposition") {
                item.content_disposition = Some(value);
                item.read_disposition(value);
            } else if name.eq_ignore_ascii_case(b"Content-Type") {
                item.content_type = Some(value);
            } else if name.eq_ignore_ascii_case(b"Content-Transfer-Encoding") {
                item.transfer_encoding = Some(value);
            }
        }

        Some(item)
    }

    fn read_disposition(&mut self, disposition: &'a [u8]) {
        for param in SplitBytes::new(disposition, b';').skip(1) {
            let param = trim_whitespace(param);
            let Some(idx) = memchr(b'=', param) else {
                continue;
            };
            let value = trim_quotes(&param[idx + 1..]);
            match &param[..idx] {
                b"name" => self.name = value,
                b"filename" => self.filename = Some(value),
                _ => {}
            }
        }
    }

    /// The form field name; empty when the part carries none.
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    pub fn filename(&self) -> Option<&'a [u8]> {
        self.filename
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// The part's content type, `text/plain` when the part does not declare one.
    pub fn content_type(&self) -> &'a [u8] {
        self.content_type.unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// The content type parsed as a [`Mime`], if it is well formed.
    pub fn mime(&self) -> Option<Mime> {
        str::from_utf8(self.content_type()).ok()?.parse().ok()
    }

    pub fn content_disposition(&self) -> Option<&'a [u8]> {
        self.content_disposition
    }

    pub fn transfer_encoding(&self) -> Option<&'a [u8]> {
        self.transfer_encoding
    }
}
