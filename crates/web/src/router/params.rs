use crate::param::{FromParam, ParamError, parse_param};
use crate::router::matcher::{placeholder, strip_query};
use quill_http::buf::SplitBytes;

/// Route parameters of a matched request.
///
/// Values are resolved lazily by position: the placeholder `{name}` that sits
/// after the n-th `/` of the pattern is bound to the segment after the n-th `/`
/// of the request path. The pattern is owned by the route table (`'server`),
/// the path by the receive buffer (`'req`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteParams<'server, 'req> {
    pattern: &'server [u8],
    path: &'req [u8],
}

impl<'server, 'req> RouteParams<'server, 'req> {
    pub fn new(pattern: &'server [u8], path: &'req [u8]) -> Self {
        Self { pattern, path: strip_query(path) }
    }

    /// Parameters for a request that did not go through a route pattern.
    pub fn empty() -> Self {
        Self { pattern: &[], path: &[] }
    }

    pub fn pattern(&self) -> &'server [u8] {
        self.pattern
    }

    pub fn get(&self, key: &[u8]) -> Option<&'req [u8]> {
        let index = SplitBytes::new(self.pattern, b'/').position(|segment| placeholder(segment) == Some(key))?;
        SplitBytes::new(self.path, b'/').nth(index)
    }

    pub fn get_as<T: FromParam<'req>>(&self, key: &[u8]) -> Result<T, ParamError> {
        parse_param(key, self.get(key))
    }

    /// Iterates over `(name, value)` for every placeholder of the pattern.
    pub fn iter(&self) -> impl Iterator<Item = (&'server [u8], &'req [u8])> + use<'server, 'req> {
        SplitBytes::new(self.pattern, b'/')
            .zip(SplitBytes::new(self.path, b'/'))
            .filter_map(|(segment, value)| placeholder(segment).map(|name| (name, value)))
    }
}
