use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A set of response compression codecs.
///
/// Used both as "what the server is willing to use" (any combination) and as
/// "what was negotiated for this request" (at most one bit set).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompressionMethod(u8);

impl CompressionMethod {
    pub const NONE: Self = Self(0);
    pub const GZIP: Self = Self(1);
    pub const DEFLATE: Self = Self(1 << 1);
    pub const BROTLI: Self = Self(1 << 2);
    pub const ALL: Self = Self(Self::GZIP.0 | Self::DEFLATE.0 | Self::BROTLI.0);

    /// Maps an `Accept-Encoding` / `Transfer-Encoding` token to a single codec.
    ///
    /// Tokens are matched case-sensitively; `br` and `brotli` both mean brotli.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"gzip" => Some(Self::GZIP),
            b"deflate" => Some(Self::DEFLATE),
            b"br" | b"brotli" => Some(Self::BROTLI),
            _ => None,
        }
    }

    /// The `Content-Encoding` token for a single codec.
    pub fn token(self) -> Option<&'static str> {
        match self {
            Self::GZIP => Some("gzip"),
            Self::DEFLATE => Some("deflate"),
            Self::BROTLI => Some("br"),
            _ => None,
        }
    }

    /// Whether exactly one codec is set.
    pub fn is_single(self) -> bool {
        self.token().is_some()
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        !other.is_none() && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for CompressionMethod {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CompressionMethod {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CompressionMethod {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("NONE");
        }

        let names = [(Self::GZIP, "GZIP"), (Self::DEFLATE, "DEFLATE"), (Self::BROTLI, "BROTLI")];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
