//! Request handling types that give route handlers access to the parsed
//! request together with its route parameters.
//!
//! - `RequestContext`: the request plus the parameters of the route it matched
//! - `RouteParams`: re-exported from [`router`](crate::router)

use crate::json::{self, JsonError};
use crate::query::QueryParams;
use crate::router::RouteParams;
use quill_http::buf::BufferPool;
use quill_http::protocol::{CompressionMethod, Method, Request};
use serde::de::DeserializeOwned;

/// Represents the context of an HTTP request, providing access to both the
/// parsed request and the route parameters resolved against its path.
///
/// The lifetime parameters ensure that the context outlives neither the route
/// table (`'server`) nor the receive buffer (`'req`).
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'server, 'req> {
    request: &'req Request<'req>,
    params: RouteParams<'server, 'req>,
}

impl<'server, 'req> RequestContext<'server, 'req> {
    /// Creates a new RequestContext with the given request and route parameters
    pub fn new(request: &'req Request<'req>, params: RouteParams<'server, 'req>) -> Self {
        Self { request, params }
    }

    /// Returns a reference to the underlying Request
    pub fn request(&self) -> &'req Request<'req> {
        self.request
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> Method {
        self.request.method()
    }

    /// Returns the request path, without its query string
    pub fn path(&self) -> &'req [u8] {
        self.request.path()
    }

    /// Returns the query parameters of the request
    pub fn query(&self) -> QueryParams<'req> {
        QueryParams::new(self.request.query())
    }

    /// Returns the value of the first header named exactly `name`
    pub fn header(&self, name: &[u8]) -> Option<&'req [u8]> {
        self.request.header(name)
    }

    /// Returns the raw request body
    pub fn body(&self) -> &'req [u8] {
        self.request.body()
    }

    /// Returns the route parameters extracted from the request path
    pub fn route_params(&self) -> &RouteParams<'server, 'req> {
        &self.params
    }

    /// Returns the compression negotiated for the response
    pub fn compression(&self) -> CompressionMethod {
        self.request.compression()
    }

    /// Deserializes the request body as JSON, de-chunking and decompressing it first
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, JsonError> {
        let body = crate::body::read_body(self.request, &BufferPool::shared())?;
        json::parse_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_http::codec::RequestParser;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        title: String,
        draft: bool,
    }

    #[test]
    fn test_accessors() {
        let request = RequestParser::new().parse(b"GET /blog/hello?page=2 HTTP/1.1\r\nHost: quill\r\n\r\n").unwrap();
        let context = RequestContext::new(&request, RouteParams::new(b"/blog/{post}", request.path()));

        assert_eq!(context.method(), Method::Get);
        assert_eq!(context.path(), b"/blog/hello");
        assert_eq!(context.header(b"Host"), Some(&b"quill"[..]));
        assert_eq!(context.query().get_as::<u32>(b"page"), Ok(2));
        assert_eq!(context.route_params().get(b"post"), Some(&b"hello"[..]));
        assert!(context.body().is_empty());
        assert!(context.compression().is_none());
    }

    #[test]
    fn test_json_body() {
        let message = "POST /posts HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"title\":\"hi\",\"draft\":true}";
        let request = RequestParser::new().parse(message.as_bytes()).unwrap();
        let context = RequestContext::new(&request, RouteParams::empty());

        let post: Post = context.json().unwrap();
        assert_eq!(post, Post { title: "hi".to_owned(), draft: true });
    }

    #[test]
    fn test_json_chunked_body() {
        let message = "POST /posts HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n9\r\n{\"title\":\r\n13\r\n\"hi\",\"draft\":false}\r\n0\r\n\r\n";
        let request = RequestParser::new().parse(message.as_bytes()).unwrap();
        let context = RequestContext::new(&request, RouteParams::empty());

        let post: Post = context.json().unwrap();
        assert_eq!(post, Post { title: "hi".to_owned(), draft: false });
    }
}
