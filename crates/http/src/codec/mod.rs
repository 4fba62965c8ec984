//! Turning bytes into requests and responses into bytes.
//!
//! # Architecture
//!
//! - Request side:
//!   - [`RequestParser`]: zero-copy parsing of the request head and body slice
//!   - [`body`]: decoding of chunked and multipart bodies
//!
//! - Response side:
//!   - [`ResponseBuilder`]: a pooled, growable buffer with header helpers
//!   - [`DateService`]: the cached value of the `Date` header
//!
//! # Example
//!
//! ```
//! use quill_http::codec::{RequestParser, ResponseBuilder};
//! use quill_http::protocol::StatusCode;
//!
//! let request = RequestParser::new().parse(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
//! assert_eq!(request.path(), b"/hello");
//!
//! let mut response = ResponseBuilder::new();
//! response.append_response(&request, StatusCode::OK, Some(b"text/plain".as_slice()), b"hello world");
//! assert_eq!(response.content(), b"hello world");
//! ```

pub mod body;
mod date;
mod request_parser;
mod response_builder;

pub use date::DateService;
pub use request_parser::DEFAULT_MAX_HEADERS;
pub use request_parser::LineEnding;
pub use request_parser::RequestParser;
pub use response_builder::DEFAULT_RESPONSE_CAPACITY;
pub use response_builder::Number;
pub use response_builder::ResponseBuilder;
pub use response_builder::SERVER_NAME;
pub use response_builder::is_http_date;
