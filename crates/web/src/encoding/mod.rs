//! Response compression: choosing a codec from `Accept-Encoding` and the
//! stream codecs that apply it.

mod decoder;
mod encoder;
mod negotiate;

pub use decoder::{Decoder, decode_to_vec};
pub use encoder::{Encoder, encode_into};
pub use negotiate::{negotiate, negotiate_request};

#[cfg(test)]
mod tests {
    use super::*;
    use quill_http::protocol::CompressionMethod;

    const TEXT: &[u8] = b"hello hello hello hello hello hello hello hello hello hello";

    fn round_trip(method: CompressionMethod) -> Vec<u8> {
        let encoded = encode_into(method, TEXT, Vec::new()).unwrap();
        decode_to_vec(method, &encoded).unwrap()
    }

    #[test]
    fn test_codecs() {
        for method in [CompressionMethod::GZIP, CompressionMethod::DEFLATE, CompressionMethod::BROTLI] {
            assert_eq!(round_trip(method), TEXT, "{method:?}");
        }
    }

    #[test]
    fn test_identity() {
        assert_eq!(encode_into(CompressionMethod::NONE, TEXT, Vec::new()).unwrap(), TEXT);
        assert_eq!(encode_into(CompressionMethod::ALL, TEXT, Vec::new()).unwrap(), TEXT);
        assert_eq!(Encoder::new(CompressionMethod::ALL, Vec::new()).method(), CompressionMethod::NONE);
    }

    #[test]
    fn test_gzip_output_is_compressed() {
        let encoded = encode_into(CompressionMethod::GZIP, TEXT, Vec::new()).unwrap();
        assert_eq!(&encoded[..2], &[0x1f, 0x8b]);
        assert!(encoded.len() < TEXT.len());
    }

    #[test]
    fn test_corrupt_input() {
        decode_to_vec(CompressionMethod::GZIP, b"not gzip").unwrap_err();
    }
}
