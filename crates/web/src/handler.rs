//! Route handlers.
//!
//! A [`RequestHandler`] is what a route points at. It sees the request through a
//! [`RequestContext`] (so it can read route and query parameters) and writes the
//! complete response, headers included, into the [`ResponseBuilder`].

use crate::RequestContext;
use quill_http::codec::ResponseBuilder;
use std::fmt;
pub use quill_http::handler::HandlerError;

pub trait RequestHandler: Send + Sync {
    fn invoke(&self, request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    fn invoke(&self, request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        (**self).invoke(request, response)
    }
}

/// A closure holder which implements [`RequestHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&RequestContext<'_, '_>, &mut ResponseBuilder) -> Result<(), HandlerError> + Send + Sync,
{
    fn invoke(&self, request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        (self.f)(request, response)
    }
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&RequestContext<'_, '_>, &mut ResponseBuilder) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler { f }
}
