use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};
use quill_http::protocol::CompressionMethod;
use std::fmt;
use std::io::{self, Write};
use tracing::trace;

const BROTLI_BUFFER_SIZE: usize = 32 * 1024;
const BROTLI_QUALITY: u32 = 3;
const BROTLI_LGWIN: u32 = 22;

/// A writer that compresses everything written to it before passing it on to
/// the inner writer.
///
/// [`CompressionMethod::NONE`], or any value naming more than one codec, passes
/// the bytes through unchanged.
pub enum Encoder<W: Write> {
    Identity(W),
    Gzip(GzEncoder<W>),
    /// zlib-wrapped deflate, which is what `Content-Encoding: deflate` means.
    Deflate(ZlibEncoder<W>),
    Brotli(Box<brotli::CompressorWriter<W>>),
}

impl<W: Write> Encoder<W> {
    pub fn new(method: CompressionMethod, writer: W) -> Self {
        match method {
            CompressionMethod::GZIP => Self::Gzip(GzEncoder::new(writer, Compression::best())),
            CompressionMethod::DEFLATE => Self::Deflate(ZlibEncoder::new(writer, Compression::best())),
            CompressionMethod::BROTLI => Self::Brotli(Box::new(brotli::CompressorWriter::new(
                writer,
                BROTLI_BUFFER_SIZE,
                BROTLI_QUALITY,
                BROTLI_LGWIN,
            ))),
            _ => Self::Identity(writer),
        }
    }

    pub fn method(&self) -> CompressionMethod {
        match self {
            Self::Identity(_) => CompressionMethod::NONE,
            Self::Gzip(_) => CompressionMethod::GZIP,
            Self::Deflate(_) => CompressionMethod::DEFLATE,
            Self::Brotli(_) => CompressionMethod::BROTLI,
        }
    }

    /// Writes the trailing bytes of the compressed stream and returns the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Identity(writer) => Ok(writer),
            Self::Gzip(encoder) => encoder.finish(),
            Self::Deflate(encoder) => encoder.finish(),
            Self::Brotli(mut encoder) => {
                encoder.flush()?;
                Ok((*encoder).into_inner())
            }
        }
    }
}

impl<W: Write> fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Encoder").field(&self.method()).finish()
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match self {
            Self::Identity(writer) => writer.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Deflate(encoder) => encoder.write(buf),
            Self::Brotli(encoder) => encoder.write(buf),
        };
        if let Err(e) = &result {
            trace!(method = ?self.method(), cause = %e, "error encoding");
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Identity(writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.flush(),
            Self::Deflate(encoder) => encoder.flush(),
            Self::Brotli(encoder) => encoder.flush(),
        }
    }
}

/// Compresses `src` with `method`, appending the result to `dst`.
pub fn encode_into<W: Write>(method: CompressionMethod, src: &[u8], dst: W) -> io::Result<W> {
    let mut encoder = Encoder::new(method, dst);
    encoder.write_all(src)?;
    encoder.finish()
}
