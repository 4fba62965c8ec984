//! The seam between the connection and application code.
//!
//! A [`Handler`] receives the parsed request and the response buffer, and fills
//! the buffer synchronously. Anything asynchronous (reading, writing, waiting)
//! stays in [`HttpConnection`](crate::connection::HttpConnection).

use crate::codec::ResponseBuilder;
use crate::protocol::Request;
use std::error::Error;
use std::sync::Arc;

/// Error type handlers may return; the connection answers with a 500.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub trait Handler: Send + Sync {
    /// Writes the response for `request` into `response`.
    ///
    /// The request is mutable so a handler can record the negotiated
    /// compression before writing headers.
    fn call(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        (**self).call(request, response)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        (**self).call(request, response)
    }
}

/// A [`Handler`] backed by a closure, see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Request<'_>, &mut ResponseBuilder) -> Result<(), HandlerError> + Send + Sync,
{
    fn call(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        (self.f)(request, response)
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Request<'_>, &mut ResponseBuilder) -> Result<(), HandlerError> + Send + Sync,
{
    HandlerFn { f }
}
