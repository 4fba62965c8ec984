use quill_http::buf::SplitBytes;
use quill_http::protocol::{CompressionMethod, Request};
use std::str;

/// Weight of an entry that carries no `q` parameter; it outranks `q=1`.
const IMPLICIT_WEIGHT: f32 = 1.1;

/// Picks the response compression from an `Accept-Encoding` value.
///
/// The entry with the highest weight whose codec is in `supported` wins, and
/// the earlier entry wins a tie. `*` stands for `wildcard`. Entries weighted
/// `q=0`, or with a weight that does not parse, are refused.
pub fn negotiate(accept_encoding: &[u8], supported: CompressionMethod, wildcard: CompressionMethod) -> CompressionMethod {
    let mut best = CompressionMethod::NONE;
    let mut best_weight = 0.0;

    for entry in SplitBytes::new(accept_encoding, b',') {
        let mut params = SplitBytes::new(entry, b';');
        let token = params.next().unwrap_or_default().trim_ascii();

        let method = match token {
            b"*" => wildcard,
            token => match CompressionMethod::from_token(token) {
                Some(method) => method,
                None => continue,
            },
        };
        if !method.is_single() || !supported.contains(method) {
            continue;
        }

        let weight = params.find_map(|param| param.trim_ascii().strip_prefix(b"q=")).map_or(IMPLICIT_WEIGHT, parse_weight);
        if weight > best_weight {
            best = method;
            best_weight = weight;
        }
    }

    best
}

/// [`negotiate`] against the request's `Accept-Encoding` header.
pub fn negotiate_request(request: &Request<'_>, supported: CompressionMethod, wildcard: CompressionMethod) -> CompressionMethod {
    request.header(b"Accept-Encoding").map_or(CompressionMethod::NONE, |value| negotiate(value, supported, wildcard))
}

fn parse_weight(raw: &[u8]) -> f32 {
    str::from_utf8(raw).ok().and_then(|raw| raw.trim().parse().ok()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_http::codec::RequestParser;

    const GZIP: CompressionMethod = CompressionMethod::GZIP;
    const ALL: CompressionMethod = CompressionMethod::ALL;

    #[test]
    fn test_highest_weight_wins() {
        assert_eq!(negotiate(b"br;q=0.9, gzip;q=0.6, deflate;q=0.5", ALL, GZIP), CompressionMethod::BROTLI);
        assert_eq!(negotiate(b"gzip;q=0.5, deflate;q=0.8", ALL, GZIP), CompressionMethod::DEFLATE);
    }

    #[test]
    fn test_unsupported_is_skipped() {
        assert_eq!(negotiate(b"deflate", GZIP | CompressionMethod::BROTLI, GZIP), CompressionMethod::NONE);
        assert_eq!(negotiate(b"br;q=0.9, gzip;q=0.1", GZIP, GZIP), GZIP);
        assert_eq!(negotiate(b"zstd, identity", ALL, GZIP), CompressionMethod::NONE);
    }

    #[test]
    fn test_implicit_weight_outranks_one() {
        assert_eq!(negotiate(b"gzip;q=1.0, br", ALL, GZIP), CompressionMethod::BROTLI);
        assert_eq!(negotiate(b"gzip, deflate, br", ALL, GZIP), GZIP);
    }

    #[test]
    fn test_refused_entries() {
        assert_eq!(negotiate(b"gzip;q=0", ALL, GZIP), CompressionMethod::NONE);
        assert_eq!(negotiate(b"gzip;q=abc, deflate;q=0.1", ALL, GZIP), CompressionMethod::DEFLATE);
        assert_eq!(negotiate(b"", ALL, GZIP), CompressionMethod::NONE);
    }

    #[test]
    fn test_wildcard() {
        assert_eq!(negotiate(b"*", ALL, GZIP), GZIP);
        assert_eq!(negotiate(b"*", ALL, CompressionMethod::BROTLI), CompressionMethod::BROTLI);
        assert_eq!(negotiate(b"*", ALL, CompressionMethod::NONE), CompressionMethod::NONE);
        assert_eq!(negotiate(b"*;q=0.2, deflate;q=0.5", ALL, GZIP), CompressionMethod::DEFLATE);
    }

    #[test]
    fn test_wildcard_must_be_one_codec() {
        assert_eq!(negotiate(b"*", ALL, ALL), CompressionMethod::NONE);
        assert_eq!(negotiate(b"*, deflate;q=0.5", ALL, GZIP | CompressionMethod::BROTLI), CompressionMethod::DEFLATE);
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert_eq!(negotiate(b"GZIP", ALL, GZIP), CompressionMethod::NONE);
        assert_eq!(negotiate(b"brotli", ALL, GZIP), CompressionMethod::BROTLI);
    }

    #[test]
    fn test_negotiate_request() {
        let parser = RequestParser::new();
        let request = parser.parse(b"GET / HTTP/1.1\r\nAccept-Encoding: gzip, deflate\r\n\r\n").unwrap();
        assert_eq!(negotiate_request(&request, ALL, GZIP), GZIP);

        let request = parser.parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(negotiate_request(&request, ALL, GZIP), CompressionMethod::NONE);
    }
}
