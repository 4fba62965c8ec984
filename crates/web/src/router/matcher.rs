//! Matching of request paths against `{name}` route patterns.
//!
//! A pattern is a `/`-separated list of literal segments and placeholders. A
//! path matches when it has exactly as many `/` as the pattern, every literal
//! segment is byte-equal and every placeholder lines up with a non-empty
//! segment. Any query string on the path is ignored.

use memchr::memchr;
use quill_http::buf::{SplitBytes, count_byte};

pub(crate) fn strip_query(path: &[u8]) -> &[u8] {
    match memchr(b'?', path) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Returns the parameter name if `segment` is a `{name}` placeholder.
pub(crate) fn placeholder(segment: &[u8]) -> Option<&[u8]> {
    segment.strip_prefix(b"{")?.strip_suffix(b"}")
}

pub fn matches(pattern: &[u8], path: &[u8]) -> bool {
    let path = strip_query(path);
    if count_byte(pattern, b'/') != count_byte(path, b'/') {
        return false;
    }

    let pattern = pattern.strip_prefix(b"/").unwrap_or(pattern);
    let path = path.strip_prefix(b"/").unwrap_or(path);

    let mut expected = SplitBytes::new(pattern, b'/');
    let mut actual = SplitBytes::new(path, b'/');
    loop {
        let (segment, value) = match (expected.next(), actual.next()) {
            (None, None) => return true,
            (segment, value) => (segment.unwrap_or_default(), value.unwrap_or_default()),
        };

        let matched = match placeholder(segment) {
            Some(_) => !value.is_empty(),
            None => segment == value,
        };
        if !matched {
            return false;
        }
    }
}

/// Returns the first pattern, in iteration order, that `path` matches.
pub fn find<'p, I>(patterns: I, path: &[u8]) -> Option<&'p [u8]>
where
    I: IntoIterator<Item = &'p [u8]>,
{
    patterns.into_iter().find(|pattern| matches(pattern, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERNS: [&[u8]; 4] = [b"/", b"/blog", b"/blog/{post}", b"/blog/{post}/edit"];

    #[test]
    fn test_find() {
        assert_eq!(find(PATTERNS, b"/"), Some(&b"/"[..]));
        assert_eq!(find(PATTERNS, b"/blog"), Some(&b"/blog"[..]));
        assert_eq!(find(PATTERNS, b"/blog/my-first-post"), Some(&b"/blog/{post}"[..]));
        assert_eq!(find(PATTERNS, b"/blog/my-first-post/edit"), Some(&b"/blog/{post}/edit"[..]));
        assert_eq!(find(PATTERNS, b"/blog/my-first-post/delete"), None);
    }

    #[test]
    fn test_query_is_ignored() {
        assert!(matches(b"/blog/{post}", b"/blog/hello?draft=true"));
        assert!(matches(b"/", b"/?a=b"));
    }

    #[test]
    fn test_placeholder_needs_a_value() {
        assert!(!matches(b"/blog/{post}", b"/blog/"));
        assert!(!matches(b"/blog/{post}/edit", b"/blog//edit"));
    }

    #[test]
    fn test_slash_count_must_be_equal() {
        assert!(!matches(b"/blog", b"/blog/"));
        assert!(!matches(b"/", b"/blog"));
        assert!(!matches(b"/blog", b"/"));
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        assert!(!matches(b"/blog", b"/Blog"));
        assert!(matches(b"/{a}/{b}", b"/x/y"));
    }
}
