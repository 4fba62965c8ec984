use flate2::read::{GzDecoder, ZlibDecoder};
use quill_http::protocol::CompressionMethod;
use std::fmt;
use std::io::{self, Read};

const BROTLI_BUFFER_SIZE: usize = 4 * 1024;

/// A reader that decompresses the bytes read from the inner reader.
pub enum Decoder<R: Read> {
    Identity(R),
    Gzip(GzDecoder<R>),
    Deflate(ZlibDecoder<R>),
    Brotli(Box<brotli::Decompressor<R>>),
}

impl<R: Read> Decoder<R> {
    pub fn new(method: CompressionMethod, reader: R) -> Self {
        match method {
            CompressionMethod::GZIP => Self::Gzip(GzDecoder::new(reader)),
            CompressionMethod::DEFLATE => Self::Deflate(ZlibDecoder::new(reader)),
            CompressionMethod::BROTLI => Self::Brotli(Box::new(brotli::Decompressor::new(reader, BROTLI_BUFFER_SIZE))),
            _ => Self::Identity(reader),
        }
    }
}

impl<R: Read> fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self {
            Self::Identity(_) => CompressionMethod::NONE,
            Self::Gzip(_) => CompressionMethod::GZIP,
            Self::Deflate(_) => CompressionMethod::DEFLATE,
            Self::Brotli(_) => CompressionMethod::BROTLI,
        };
        f.debug_tuple("Decoder").field(&method).finish()
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Identity(reader) => reader.read(buf),
            Self::Gzip(decoder) => decoder.read(buf),
            Self::Deflate(decoder) => decoder.read(buf),
            Self::Brotli(decoder) => decoder.read(buf),
        }
    }
}

/// Decompresses all of `src` into a new vector.
pub fn decode_to_vec(method: CompressionMethod, src: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(src.len() * 2);
    Decoder::new(method, src).read_to_end(&mut decoded)?;
    Ok(decoded)
}
