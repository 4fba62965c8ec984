//! Byte-level building blocks: delimiter scanning and pooled buffers.
//!
//! Everything above this module works on borrowed `&[u8]` views, and every
//! owned array it needs comes from a [`BufferPool`].

mod pool;
mod split;

pub use pool::BufferPool;
pub use pool::DEFAULT_RETAINED_PER_CLASS;
pub use pool::PooledBuf;
pub use split::SplitBytes;
pub use split::SplitSeq;
pub use split::count_byte;
