//! A small routing framework on top of `quill-http`.
//!
//! # Example
//!
//! ```no_run
//! use quill_web::handler::{HandlerError, handler_fn};
//! use quill_web::router::{get, Router};
//! use quill_web::{RequestContext, Server};
//! use quill_http::codec::ResponseBuilder;
//! use quill_http::protocol::StatusCode;
//!
//! fn show_post(request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
//!     let post = request.route_params().get_as::<&str>(b"post")?;
//!     let page = request.query().get_as::<u32>(b"page").unwrap_or(1);
//!     let body = format!("post {post}, page {page}");
//!     response.append_response(request.request(), StatusCode::OK, Some(b"text/plain".as_slice()), body.as_bytes());
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let router = Router::builder().route("/blog/{post}", get(handler_fn(show_post))).build();
//!
//!     Server::builder()
//!         .router(router)
//!         .address("127.0.0.1:3000")
//!         .build()
//!         .map_err(std::io::Error::other)?
//!         .start()
//!         .await
//! }
//! ```

mod request;
mod server;

pub mod body;
pub mod cache;
pub mod encoding;
pub mod handler;
pub mod json;
pub mod logging;
pub mod param;
pub mod query;
pub mod router;
pub mod static_files;

pub use handler::{FnHandler, RequestHandler, handler_fn};
pub use query::QueryParams;
pub use request::RequestContext;
pub use router::{RouteParams, Router};
pub use server::{DEFAULT_MAX_CONNECTIONS, Server, ServerBuildError, ServerBuilder};
