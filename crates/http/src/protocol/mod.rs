//! Core HTTP protocol types.
//!
//! This module holds the data model shared by the parser, the response builder
//! and the framework crate:
//!
//! - **Requests** ([`Request`], [`Header`], [`Headers`]): a parsed request whose byte fields
//!   borrow from the receive buffer
//! - **Methods** ([`Method`]): the closed set of understood request methods
//! - **Compression** ([`CompressionMethod`]): the bit-flag set of response codecs
//! - **Errors** ([`HttpError`], [`ParseError`], [`SendError`]): per-connection
//!   failures, split by direction; [`ChunkedError`] and [`MultipartError`] for
//!   the body codecs
//!
//! Status codes come from the [`http`] crate and are re-exported as [`StatusCode`].

mod compression;
pub use compression::CompressionMethod;

mod method;
pub use method::Method;

mod request;
pub use request::Header;
pub use request::Headers;
pub use request::Request;

mod error;
pub use error::ChunkedError;
pub use error::HttpError;
pub use error::MultipartError;
pub use error::ParseError;
pub use error::SendError;

pub use http::StatusCode;
