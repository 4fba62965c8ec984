//! Decoding of HTTP chunked transfer encoding.
//!
//! A chunked body is a sequence of chunks, each made of a hexadecimal size line
//! and that many bytes of data, closed by a zero-sized chunk
//! ([RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//!
//! Decoding works in two passes over the already-received bytes, both driven by
//! the same [`Chunks`] walker:
//!
//! 1. [`decoded_len`] sums the chunk sizes so the caller can size a destination
//! 2. [`decode_into`] copies each chunk's data into that destination
//!
//! [`decode`] does both with a buffer rented from a [`BufferPool`].
//!
//! Chunk extensions (`;name=value` after the size) are ignored, empty lines
//! between chunks are skipped, and trailer fields after the terminal chunk are
//! not validated.

use crate::buf::{BufferPool, PooledBuf, SplitBytes};
use crate::protocol::{ChunkedError, Request};
use crate::utils::trim_whitespace;
use memchr::{memchr, memmem};
use std::ops::Deref;
use std::sync::Arc;
use tracing::trace;
use ChunkState::*;

/// Longest chunk size accepted, in hex digits.
const MAX_SIZE_DIGITS: usize = 16;

/// Iterates over the data of each chunk in a chunked body.
///
/// The walker stops at the zero-sized chunk. Malformed input yields one
/// `Err` and then ends the iteration.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    src: &'a [u8],
    pos: usize,
    state: ChunkState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Read the size line of the next chunk
    Size,
    /// Read this many bytes of chunk data
    Data(usize),
    /// Read the CRLF closing the chunk data
    DataEnd,
    /// Terminal chunk seen or an error reported
    Done,
}

impl<'a> Chunks<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0, state: Size }
    }

    /// Number of bytes of `src` consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn fail(&mut self, error: ChunkedError) -> Option<Result<&'a [u8], ChunkedError>> {
        self.state = Done;
        Some(Err(error))
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<&'a [u8], ChunkedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.src[self.pos..];
            match self.state {
                Size => {
                    let Some(line_end) = memchr(b'\n', rest) else {
                        return self.fail(ChunkedError::Incomplete);
                    };

                    let line = &rest[..line_end];
                    let line = line.strip_suffix(b"\r").unwrap_or(line);
                    self.pos += line_end + 1;

                    if line.is_empty() {
                        continue;
                    }

                    match parse_chunk_size(line) {
                        Ok(0) => {
                            trace!("reached terminal chunk");
                            self.state = Done;
                            return None;
                        }
                        Ok(size) => self.state = Data(size),
                        Err(e) => return self.fail(e),
                    }
                }
                Data(size) => {
                    if rest.len() < size {
                        return self.fail(ChunkedError::Incomplete);
                    }

                    self.pos += size;
                    self.state = DataEnd;
                    return Some(Ok(&rest[..size]));
                }
                DataEnd => {
                    if rest.starts_with(b"\r\n") {
                        self.pos += 2;
                    } else if rest.starts_with(b"\n") {
                        self.pos += 1;
                    } else if rest.is_empty() {
                        return self.fail(ChunkedError::Incomplete);
                    } else {
                        return self.fail(ChunkedError::MissingCrlf);
                    }
                    self.state = Size;
                }
                Done => return None,
            }
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, ChunkedError> {
    let size = SplitBytes::new(line, b';').next().unwrap_or_default();
    let digits = trim_whitespace(size);

    if digits.is_empty() || digits.len() > MAX_SIZE_DIGITS || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(ChunkedError::InvalidSize);
    }

    digits.iter().try_fold(0usize, |acc, &digit| {
        let value = match digit {
            b'0'..=b'9' => digit - b'0',
            b'a'..=b'f' => digit - b'a' + 10,
            _ => digit - b'A' + 10,
        };
        acc.checked_mul(16).and_then(|acc| acc.checked_add(usize::from(value))).ok_or(ChunkedError::InvalidSize)
    })
}

/// Returns the total length of the decoded body.
///
/// `Ok` also means the terminal chunk was reached, which makes this a cheap
/// "is the chunked body complete" check.
pub fn decoded_len(src: &[u8]) -> Result<usize, ChunkedError> {
    Chunks::new(src).try_fold(0usize, |acc, chunk| chunk.map(|data| acc + data.len()))
}

/// Copies the chunk data of `src` contiguously into `dst` and returns how many
/// bytes were written.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<usize, ChunkedError> {
    let mut written = 0;
    for chunk in Chunks::new(src) {
        let data = chunk?;
        let end = written + data.len();
        if end > dst.len() {
            return Err(ChunkedError::BufferTooSmall { needed: end });
        }
        dst[written..end].copy_from_slice(data);
        written = end;
    }
    Ok(written)
}

/// Decodes `src` into a buffer rented from `pool`.
pub fn decode(src: &[u8], pool: &Arc<BufferPool>) -> Result<DecodedBody, ChunkedError> {
    let len = decoded_len(src)?;
    let mut buf = pool.rent(len);
    let written = decode_into(src, &mut buf)?;
    Ok(DecodedBody { buf, len: written })
}

/// A de-chunked body held in a pooled buffer.
#[derive(Debug)]
pub struct DecodedBody {
    buf: PooledBuf,
    len: usize,
}

impl DecodedBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Deref for DecodedBody {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

/// Whether the request declares a chunked `Transfer-Encoding`.
pub fn has_chunked_body(request: &Request<'_>) -> bool {
    request.header(b"Transfer-Encoding").is_some_and(|value| memmem::find(value, b"chunked").is_some())
}

/// The coding applied before chunking, such as `gzip` in `gzip, chunked`.
pub fn chunk_encoding<'buf>(request: &Request<'buf>) -> Option<&'buf [u8]> {
    let value = request.header(b"Transfer-Encoding")?;
    SplitBytes::new(value, b',').map(trim_whitespace).find(|token| !token.is_empty() && *token != b"chunked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RequestParser;

    #[test]
    fn test_basic() {
        let src = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

        assert_eq!(decoded_len(src), Ok(9));

        let mut dst = [0u8; 9];
        assert_eq!(decode_into(src, &mut dst), Ok(9));
        assert_eq!(&dst, b"Wikipedia");
    }

    #[test]
    fn test_multiple_chunks() {
        let src = b"3\r\nabc\r\n3\r\ndef\r\nA\r\n0123456789\r\n0\r\n\r\n";
        let chunks: Vec<&[u8]> = Chunks::new(src).map(Result::unwrap).collect();

        assert_eq!(chunks, vec![&b"abc"[..], b"def", b"0123456789"]);
    }

    #[test]
    fn test_extension_and_empty_lines() {
        let src = b"4;name=value\r\nWiki\r\n\r\n5 \r\npedia\r\n0\r\nTrailer: ignored\r\n\r\n";
        let pool = Arc::new(BufferPool::new());

        let decoded = decode(src, &pool).unwrap();
        assert_eq!(decoded.as_bytes(), b"Wikipedia");
    }

    #[test]
    fn test_uppercase_hex() {
        let mut src = b"1A\r\n".to_vec();
        src.extend_from_slice(&[b'x'; 26]);
        src.extend_from_slice(b"\r\n0\r\n\r\n");

        assert_eq!(decoded_len(&src), Ok(26));
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(decoded_len(b"zz\r\nabc\r\n0\r\n\r\n"), Err(ChunkedError::InvalidSize));
        assert_eq!(decoded_len(b";ext\r\n0\r\n\r\n"), Err(ChunkedError::InvalidSize));
        assert_eq!(decoded_len(b"fffffffffffffffff\r\n"), Err(ChunkedError::InvalidSize));
    }

    #[test]
    fn test_missing_crlf_after_data() {
        assert_eq!(decoded_len(b"3\r\nabcX\r\n0\r\n\r\n"), Err(ChunkedError::MissingCrlf));
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(decoded_len(b"4\r\nWi"), Err(ChunkedError::Incomplete));
        assert_eq!(decoded_len(b"4\r\nWiki\r\n"), Err(ChunkedError::Incomplete));
        assert_eq!(decoded_len(b""), Err(ChunkedError::Incomplete));
    }

    #[test]
    fn test_destination_too_small() {
        let mut dst = [0u8; 4];
        assert_eq!(
            decode_into(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n", &mut dst),
            Err(ChunkedError::BufferTooSmall { needed: 9 })
        );
    }

    #[test]
    fn test_transfer_encoding_helpers() {
        let parser = RequestParser::new();

        let request = parser.parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\n\r\n").unwrap();
        assert!(has_chunked_body(&request));
        assert_eq!(chunk_encoding(&request), Some(&b"gzip"[..]));

        let request = parser.parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").unwrap();
        assert!(has_chunked_body(&request));
        assert_eq!(chunk_encoding(&request), None);

        let request = parser.parse(b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc").unwrap();
        assert!(!has_chunked_body(&request));
        assert_eq!(chunk_encoding(&request), None);
    }
}
