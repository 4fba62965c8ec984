//! Small helpers shared by the parser and codecs.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Works like `assert!` but produces an `Err` instead of a panic, so
/// validation inside the parser reads as a list of preconditions:
///
/// ```ignore
/// ensure!(headers.len() < max_headers, ParseError::too_many_headers(max_headers));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Trims ASCII spaces and tabs from both ends of `bytes`.
pub(crate) fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !matches!(b, b' ' | b'\t')).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !matches!(b, b' ' | b'\t')).map_or(start, |idx| idx + 1);
    &bytes[start..end]
}

/// Strips one pair of surrounding double quotes, if present.
pub(crate) fn trim_quotes(bytes: &[u8]) -> &[u8] {
    match bytes {
        [b'"', inner @ .., b'"'] => inner,
        _ => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_whitespace() {
        assert_eq!(trim_whitespace(b"  gzip\t"), b"gzip");
        assert_eq!(trim_whitespace(b"   "), b"");
        assert_eq!(trim_whitespace(b""), b"");
        assert_eq!(trim_whitespace(b"a b"), b"a b");
    }

    #[test]
    fn test_trim_quotes() {
        assert_eq!(trim_quotes(b"\"boundary\""), b"boundary");
        assert_eq!(trim_quotes(b"boundary"), b"boundary");
        assert_eq!(trim_quotes(b"\""), b"\"");
    }
}
