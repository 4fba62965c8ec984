//! Route registration and dispatch.
//!
//! Routes are kept in registration order and the first match wins. The table
//! lives behind an [`ArcSwap`]: every request works on a lock-free snapshot,
//! while [`Router::add`] and [`Router::remove`] publish a modified copy.

pub mod matcher;
mod params;

pub use params::RouteParams;

use crate::handler::RequestHandler;
use arc_swap::ArcSwap;
use quill_http::protocol::Method;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A registered route: method, pattern and the handler serving it.
#[derive(Clone)]
pub struct RouteEntry {
    method: Method,
    pattern: String,
    handler: Arc<dyn RequestHandler>,
}

impl RouteEntry {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry").field("method", &self.method).field("pattern", &self.pattern).finish()
    }
}

/// Outcome of looking a request up in a [`RouteTable`].
#[derive(Debug, Clone, Copy)]
pub enum RouteLookup<'t> {
    Found(&'t RouteEntry),
    /// Some pattern matched the path, but none of them for this method.
    MethodNotAllowed,
    NotFound,
}

/// An immutable snapshot of the registered routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first entry matching both `path` and `method`.
    ///
    /// `HEAD` and `OPTIONS` are answered by the first entry matching the path,
    /// whatever its method.
    pub fn lookup(&self, method: Method, path: &[u8]) -> RouteLookup<'_> {
        let ignore_method = matches!(method, Method::Head | Method::Options);
        let mut path_matched = false;

        for entry in &self.entries {
            if !matcher::matches(entry.pattern.as_bytes(), path) {
                continue;
            }
            if ignore_method || entry.method == method {
                return RouteLookup::Found(entry);
            }
            path_matched = true;
        }

        if path_matched { RouteLookup::MethodNotAllowed } else { RouteLookup::NotFound }
    }
}

/// The route table shared by all connections of a server.
pub struct Router {
    table: ArcSwap<RouteTable>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// A snapshot of the current routes; later changes don't affect it.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Appends a route. It is matched after every route registered before it.
    pub fn add(&self, pattern: impl Into<String>, route: MethodRoute) {
        let entry = route.into_entry(pattern.into());
        debug!(method = %entry.method, pattern = %entry.pattern, "adding route");
        self.table.rcu(|table| {
            let mut entries = table.entries.clone();
            entries.push(entry.clone());
            RouteTable { entries }
        });
    }

    /// Removes every route registered for `method` and `pattern`, returning
    /// whether anything was removed.
    pub fn remove(&self, method: Method, pattern: &str) -> bool {
        let is_target = |entry: &RouteEntry| entry.method == method && entry.pattern == pattern;
        let previous = self.table.rcu(|table| {
            let entries = table.entries.iter().filter(|entry| !is_target(*entry)).cloned().collect();
            RouteTable { entries }
        });
        let removed = previous.entries.iter().any(is_target);
        debug!(%method, pattern, removed, "removing route");
        removed
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("table", &self.table.load()).finish()
    }
}

#[derive(Debug, Default)]
pub struct RouterBuilder {
    entries: Vec<RouteEntry>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: impl Into<String>, route: MethodRoute) -> Self {
        self.entries.push(route.into_entry(pattern.into()));
        self
    }

    pub fn build(self) -> Router {
        Router { table: ArcSwap::from_pointee(RouteTable { entries: self.entries }) }
    }
}

/// A handler bound to a request method, waiting for its pattern.
pub struct MethodRoute {
    method: Method,
    handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for MethodRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRoute").field("method", &self.method).finish_non_exhaustive()
    }
}

impl MethodRoute {
    pub fn new<H: RequestHandler + 'static>(method: Method, handler: H) -> Self {
        Self { method, handler: Arc::new(handler) }
    }

    fn into_entry(self, pattern: String) -> RouteEntry {
        RouteEntry { method: self.method, pattern, handler: self.handler }
    }
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        pub fn $name<H: RequestHandler + 'static>(handler: H) -> MethodRoute {
            MethodRoute::new(Method::$method, handler)
        }
    };
}

method_route!(get, Get);
method_route!(post, Post);
method_route!(put, Put);
method_route!(delete, Delete);
method_route!(patch, Patch);
method_route!(head, Head);
method_route!(options, Options);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn noop() -> impl RequestHandler {
        handler_fn(|_request, _response| Ok(()))
    }

    fn blog_router() -> Router {
        Router::builder()
            .route("/", get(noop()))
            .route("/blog", get(noop()))
            .route("/blog/{post}", get(noop()))
            .route("/blog/{post}", put(noop()))
            .route("/blog/{post}/edit", post(noop()))
            .build()
    }

    fn found(lookup: RouteLookup<'_>) -> Option<(Method, &str)> {
        match lookup {
            RouteLookup::Found(entry) => Some((entry.method(), entry.pattern())),
            _ => None,
        }
    }

    #[test]
    fn test_lookup() {
        let table = blog_router().table();

        assert_eq!(found(table.lookup(Method::Get, b"/")), Some((Method::Get, "/")));
        assert_eq!(found(table.lookup(Method::Get, b"/blog/hello")), Some((Method::Get, "/blog/{post}")));
        assert_eq!(found(table.lookup(Method::Put, b"/blog/hello")), Some((Method::Put, "/blog/{post}")));
        assert_eq!(found(table.lookup(Method::Post, b"/blog/hello/edit?x=1")), Some((Method::Post, "/blog/{post}/edit")));
    }

    #[test]
    fn test_lookup_failures() {
        let table = blog_router().table();

        assert!(matches!(table.lookup(Method::Delete, b"/blog/hello"), RouteLookup::MethodNotAllowed));
        assert!(matches!(table.lookup(Method::Get, b"/blog/hello/delete"), RouteLookup::NotFound));
        assert!(matches!(table.lookup(Method::None, b"/blog"), RouteLookup::MethodNotAllowed));
    }

    #[test]
    fn test_head_and_options_ignore_method() {
        let table = blog_router().table();

        assert_eq!(found(table.lookup(Method::Head, b"/blog/x/edit")), Some((Method::Post, "/blog/{post}/edit")));
        assert_eq!(found(table.lookup(Method::Options, b"/blog")), Some((Method::Get, "/blog")));
    }

    #[test]
    fn test_add_and_remove() {
        let router = blog_router();
        let snapshot = router.table();

        router.add("/about", get(noop()));
        assert!(matches!(router.table().lookup(Method::Get, b"/about"), RouteLookup::Found(_)));
        assert!(matches!(snapshot.lookup(Method::Get, b"/about"), RouteLookup::NotFound));

        assert!(router.remove(Method::Put, "/blog/{post}"));
        assert!(!router.remove(Method::Put, "/blog/{post}"));
        assert!(matches!(router.table().lookup(Method::Put, b"/blog/x"), RouteLookup::MethodNotAllowed));
        assert_eq!(router.table().len(), 5);
    }
}
