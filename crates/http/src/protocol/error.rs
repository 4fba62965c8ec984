use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {reason}")]
    HandlerError { reason: String },
}

impl HttpError {
    pub fn handler<S: ToString>(str: S) -> Self {
        Self::HandlerError { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("empty request")]
    EmptyRequest,

    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the client sent something unparseable, as opposed to a transport failure.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkedError {
    #[error("invalid chunk size line")]
    InvalidSize,

    #[error("chunk data is not followed by CRLF")]
    MissingCrlf,

    #[error("chunked body ended before the terminal chunk")]
    Incomplete,

    #[error("destination too small, need at least {needed} bytes")]
    BufferTooSmall { needed: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    #[error("missing content-type header")]
    MissingContentType,

    #[error("content-type is not multipart/form-data")]
    NotMultipart,

    #[error("missing multipart boundary")]
    MissingBoundary,
}
