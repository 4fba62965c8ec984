//! Per-connection request processing.
//!
//! # Components
//!
//! - [`HttpConnection`]: serves one request on an async stream:
//!   - Receives the request into a pooled buffer
//!   - Absorbs delayed TCP segments with short follow-up reads
//!   - Answers `Expect: 100-continue`
//!   - Runs the [`Handler`](crate::handler::Handler) and writes its response
//! - [`ConnectionOptions`]: buffer sizes, timeouts and parser settings

mod http_connection;

pub use http_connection::ConnectionOptions;
pub use http_connection::DEFAULT_RECEIVE_BUFFER_SIZE;
pub use http_connection::HttpConnection;
