//! Request body access that undoes transfer codings.

use crate::encoding::decode_to_vec;
use quill_http::buf::BufferPool;
use quill_http::codec::body::{DecodedBody, chunked};
use quill_http::protocol::{ChunkedError, CompressionMethod, Request};
use std::io;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("invalid chunked body: {source}")]
    Chunked {
        #[from]
        source: ChunkedError,
    },

    #[error("unsupported transfer coding: {coding}")]
    UnsupportedCoding { coding: String },

    #[error("failed to decompress body: {source}")]
    Decompress { source: io::Error },
}

/// A request body as the handler should see it.
#[derive(Debug)]
pub enum RequestBody<'a> {
    /// The body exactly as it was received.
    Raw(&'a [u8]),
    /// A de-chunked body in a pooled buffer.
    Dechunked(DecodedBody),
    /// A body that had to be decompressed.
    Decoded(Vec<u8>),
}

impl Deref for RequestBody<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Raw(bytes) => bytes,
            Self::Dechunked(body) => body.as_bytes(),
            Self::Decoded(bytes) => bytes,
        }
    }
}

/// Reads the body of `request`, de-chunking it and then undoing the coding
/// applied before chunking (`gzip, chunked` and the like).
pub fn read_body<'a>(request: &Request<'a>, pool: &Arc<BufferPool>) -> Result<RequestBody<'a>, BodyError> {
    if !chunked::has_chunked_body(request) {
        return Ok(RequestBody::Raw(request.body()));
    }

    let dechunked = chunked::decode(request.body(), pool)?;
    let Some(coding) = chunked::chunk_encoding(request) else {
        return Ok(RequestBody::Dechunked(dechunked));
    };

    let method = CompressionMethod::from_token(coding)
        .ok_or_else(|| BodyError::UnsupportedCoding { coding: String::from_utf8_lossy(coding).into_owned() })?;
    let decoded = decode_to_vec(method, &dechunked).map_err(|source| BodyError::Decompress { source })?;
    debug!(coding = ?method, from = dechunked.len(), to = decoded.len(), "request body decompressed");
    Ok(RequestBody::Decoded(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_into;
    use quill_http::codec::RequestParser;

    fn chunked_message(transfer_encoding: &str, payload: &[u8]) -> Vec<u8> {
        let mut message = format!("POST /upload HTTP/1.1\r\nTransfer-Encoding: {transfer_encoding}\r\n\r\n{:x}\r\n", payload.len()).into_bytes();
        message.extend_from_slice(payload);
        message.extend_from_slice(b"\r\n0\r\n\r\n");
        message
    }

    #[test]
    fn test_plain_body() {
        let request = RequestParser::new().parse(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap();
        let body = read_body(&request, &BufferPool::shared()).unwrap();

        assert!(matches!(body, RequestBody::Raw(_)));
        assert_eq!(&*body, b"hello");
    }

    #[test]
    fn test_chunked_body() {
        let request = RequestParser::new().parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n").unwrap();
        let body = read_body(&request, &BufferPool::shared()).unwrap();

        assert!(matches!(body, RequestBody::Dechunked(_)));
        assert_eq!(&*body, b"Wikipedia");
    }

    #[test]
    fn test_gzip_chunked_body() {
        let payload = encode_into(CompressionMethod::GZIP, b"compressed upload", Vec::new()).unwrap();
        let message = chunked_message("gzip, chunked", &payload);
        let request = RequestParser::new().parse(&message).unwrap();

        let body = read_body(&request, &BufferPool::shared()).unwrap();
        assert_eq!(&*body, b"compressed upload");
    }

    #[test]
    fn test_errors() {
        let request = RequestParser::new().parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n").unwrap();
        assert!(matches!(read_body(&request, &BufferPool::shared()), Err(BodyError::Chunked { .. })));

        let message = chunked_message("compress, chunked", b"abc");
        let request = RequestParser::new().parse(&message).unwrap();
        assert!(matches!(read_body(&request, &BufferPool::shared()), Err(BodyError::UnsupportedCoding { .. })));

        let message = chunked_message("gzip, chunked", b"definitely not gzip");
        let request = RequestParser::new().parse(&message).unwrap();
        assert!(matches!(read_body(&request, &BufferPool::shared()), Err(BodyError::Decompress { .. })));
    }
}
