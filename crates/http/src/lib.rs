//! The zero-copy HTTP/1.1 engine behind quill.
//!
//! This crate turns socket bytes into a borrowed [`Request`](protocol::Request),
//! lets a [`Handler`](handler::Handler) fill a pooled
//! [`ResponseBuilder`](codec::ResponseBuilder), and writes the result back. It
//! deliberately does one request per connection and keeps every step on
//! borrowed slices of a pooled receive buffer.
//!
//! # Features
//!
//! - Zero-copy request parsing: method, path, query, headers and body are all
//!   views into the receive buffer
//! - Pooled buffers for both directions, returned on drop
//! - A growable response buffer with a header/content split, so content can be
//!   compressed after the handler ran
//! - Chunked transfer decoding and `multipart/form-data` parsing
//! - `Expect: 100-continue` handling
//!
//! # Example
//!
//! ```no_run
//! use quill_http::buf::BufferPool;
//! use quill_http::codec::ResponseBuilder;
//! use quill_http::connection::{ConnectionOptions, HttpConnection};
//! use quill_http::handler::{make_handler, HandlerError};
//! use quill_http::protocol::{Request, StatusCode};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!     let pool = BufferPool::shared();
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         let connection = HttpConnection::new(tcp_stream, pool.clone(), ConnectionOptions::default());
//!
//!         tokio::spawn(async move {
//!             match connection.process(handler.as_ref()).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! fn hello_world(request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
//!     let body = format!("hello from {}", String::from_utf8_lossy(request.path()));
//!     response.append_response(request, StatusCode::OK, Some(b"text/plain".as_slice()), body.as_bytes());
//!     Ok(())
//! }
//! ```

pub mod buf;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;

pub(crate) use utils::ensure;
