//! Lazy delimiter splitting over borrowed byte slices.
//!
//! Both splitters stop as soon as the unscanned remainder is empty: an empty
//! input yields nothing and a trailing separator does not produce a trailing
//! empty item. Consecutive separators still yield the empty slice between
//! them, which is what the route matcher relies on to reject `//`.

use memchr::memchr;
use memchr::memmem::Finder;

/// Splits a byte slice on a single separator byte.
///
/// ```
/// use quill_http::buf::SplitBytes;
///
/// let segments: Vec<&[u8]> = SplitBytes::new(b"blog/first-post/edit", b'/').collect();
/// assert_eq!(segments, vec![&b"blog"[..], b"first-post", b"edit"]);
/// ```
#[derive(Debug, Clone)]
pub struct SplitBytes<'a> {
    remaining: &'a [u8],
    separator: u8,
}

impl<'a> SplitBytes<'a> {
    pub fn new(bytes: &'a [u8], separator: u8) -> Self {
        Self { remaining: bytes, separator }
    }

    /// The part of the input that has not been yielded yet.
    pub fn remainder(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for SplitBytes<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        match memchr(self.separator, self.remaining) {
            Some(idx) => {
                let item = &self.remaining[..idx];
                self.remaining = &self.remaining[idx + 1..];
                Some(item)
            }
            None => {
                let item = self.remaining;
                self.remaining = &[];
                Some(item)
            }
        }
    }
}

/// Splits a byte slice on a multi-byte separator such as `\r\n`.
#[derive(Debug, Clone)]
pub struct SplitSeq<'a, 's> {
    remaining: &'a [u8],
    finder: Finder<'s>,
}

impl<'a, 's> SplitSeq<'a, 's> {
    pub fn new(bytes: &'a [u8], separator: &'s [u8]) -> Self {
        Self { remaining: bytes, finder: Finder::new(separator) }
    }

    pub fn remainder(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for SplitSeq<'a, '_> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let separator_len = self.finder.needle().len();
        match self.finder.find(self.remaining) {
            Some(idx) if separator_len > 0 => {
                let item = &self.remaining[..idx];
                self.remaining = &self.remaining[idx + separator_len..];
                Some(item)
            }
            _ => {
                let item = self.remaining;
                self.remaining = &[];
                Some(item)
            }
        }
    }
}

/// Counts the occurrences of `byte` in `bytes`.
pub fn count_byte(bytes: &[u8], byte: u8) -> usize {
    memchr::memchr_iter(byte, bytes).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bytes_basic() {
        let items: Vec<&[u8]> = SplitBytes::new(b"a&b=c&d", b'&').collect();
        assert_eq!(items, vec![&b"a"[..], b"b=c", b"d"]);
    }

    #[test]
    fn test_split_bytes_empty_input() {
        assert_eq!(SplitBytes::new(b"", b'/').next(), None);
    }

    #[test]
    fn test_split_bytes_leading_and_consecutive_separator() {
        let items: Vec<&[u8]> = SplitBytes::new(b"/blog//edit", b'/').collect();
        assert_eq!(items, vec![&b""[..], b"blog", b"", b"edit"]);
    }

    #[test]
    fn test_split_bytes_trailing_separator() {
        let items: Vec<&[u8]> = SplitBytes::new(b"blog/", b'/').collect();
        assert_eq!(items, vec![&b"blog"[..]]);
    }

    #[test]
    fn test_split_bytes_restart() {
        let input = b"x/y";
        let first: Vec<&[u8]> = SplitBytes::new(input, b'/').collect();
        let second: Vec<&[u8]> = SplitBytes::new(input, b'/').collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_seq_crlf() {
        let mut lines = SplitSeq::new(b"GET / HTTP/1.1\r\nHost: a\r\n", b"\r\n");
        assert_eq!(lines.next(), Some(&b"GET / HTTP/1.1"[..]));
        assert_eq!(lines.next(), Some(&b"Host: a"[..]));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_split_seq_without_separator() {
        let mut lines = SplitSeq::new(b"no separator", b"--xyz");
        assert_eq!(lines.next(), Some(&b"no separator"[..]));
        assert_eq!(lines.next(), None);
        assert!(lines.remainder().is_empty());
    }

    #[test]
    fn test_count_byte() {
        assert_eq!(count_byte(b"/blog/{post}/edit", b'/'), 3);
        assert_eq!(count_byte(b"", b'/'), 0);
    }
}
