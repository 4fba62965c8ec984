//! Lazy, zero-copy query string access.
//!
//! The query is never decoded up front: every lookup walks the raw bytes,
//! splitting on `&` and then on the first `=`. A piece without `=` is a key
//! with an empty value. Keys compare byte-for-byte and the first occurrence of
//! a key wins. Percent-decoding is left to the caller.

use crate::param::{FromParam, ParamError, parse_param};
use memchr::memchr;
use quill_http::buf::SplitBytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryParams<'a> {
    query: &'a [u8],
}

impl<'a> QueryParams<'a> {
    /// Wraps a query string; an optional leading `?` is skipped.
    pub fn new(query: &'a [u8]) -> Self {
        Self { query: query.strip_prefix(b"?").unwrap_or(query) }
    }

    /// Takes the query part of a full URL or request target.
    pub fn from_url(url: &'a [u8]) -> Self {
        match memchr(b'?', url) {
            Some(idx) => Self::new(&url[idx + 1..]),
            None => Self::new(&url[url.len()..]),
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<&'a [u8]> {
        self.iter().find(|(name, _)| *name == key).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Parses the value of `key` into `T`.
    ///
    /// Fails with [`ParamError::Missing`] when the key is absent and with
    /// [`ParamError::Invalid`] when its value does not parse.
    pub fn get_as<T: FromParam<'a>>(&self, key: &[u8]) -> Result<T, ParamError> {
        parse_param(key, self.get(key))
    }

    /// Iterates over all `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + use<'a> {
        SplitBytes::new(self.query, b'&').filter(|piece| !piece.is_empty()).map(|piece| match memchr(b'=', piece) {
            Some(idx) => (&piece[..idx], &piece[idx + 1..]),
            None => (piece, &piece[piece.len()..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Date;
    use time::macros::date;

    #[test]
    fn test_typed_values() {
        let query = QueryParams::new(b"?id=2&date=2024-01-01");

        assert_eq!(query.get_as::<i32>(b"id"), Ok(2));
        assert_eq!(query.get_as::<Date>(b"date"), Ok(date!(2024-01-01)));
        assert!(matches!(query.get_as::<Date>(b"id"), Err(ParamError::Invalid { .. })));
        assert!(matches!(query.get_as::<i32>(b"page"), Err(ParamError::Missing { .. })));
    }

    #[test]
    fn test_raw_values() {
        let query = QueryParams::new(b"hello=world&value=blog&flag&empty=");

        assert_eq!(query.get(b"hello"), Some(&b"world"[..]));
        assert_eq!(query.get(b"value"), Some(&b"blog"[..]));
        assert_eq!(query.get(b"flag"), Some(&b""[..]));
        assert_eq!(query.get(b"empty"), Some(&b""[..]));
        assert!(query.contains(b"flag"));
        assert!(!query.contains(b"hell"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let query = QueryParams::new(b"a=1&a=2");
        assert_eq!(query.get_as::<u8>(b"a"), Ok(1));
        assert_eq!(query.iter().count(), 2);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let query = QueryParams::new(b"token=a=b");
        assert_eq!(query.get(b"token"), Some(&b"a=b"[..]));
    }

    #[test]
    fn test_from_url() {
        let query = QueryParams::from_url(b"/search?page=1&per_page=10");
        assert_eq!(query.get_as::<u32>(b"per_page"), Ok(10));

        let query = QueryParams::from_url(b"/search");
        assert!(query.is_empty());
        assert_eq!(query.get(b"page"), None);
    }
}
