//! A rent/return pool of byte arrays.
//!
//! Arrays are grouped in power-of-two size classes from 512 bytes up to 1 MiB.
//! Each class is a bounded lock-free queue, so renting and returning never
//! block and never allocate once the pool is warm. Requests larger than the
//! biggest class are served with a plain allocation that is simply dropped
//! when the [`PooledBuf`] goes away.

use crossbeam::queue::ArrayQueue;
use once_cell::sync::Lazy;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

const MIN_CLASS_SHIFT: u32 = 9;
const MAX_CLASS_SHIFT: u32 = 20;
const CLASS_COUNT: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;

/// How many idle arrays each size class keeps by default.
pub const DEFAULT_RETAINED_PER_CLASS: usize = 64;

static SHARED_POOL: Lazy<Arc<BufferPool>> = Lazy::new(|| Arc::new(BufferPool::new()));

pub struct BufferPool {
    classes: Vec<ArrayQueue<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_retained(DEFAULT_RETAINED_PER_CLASS)
    }

    /// Creates a pool that keeps at most `retained` idle arrays per size class.
    pub fn with_retained(retained: usize) -> Self {
        let retained = retained.max(1);
        let classes = (0..CLASS_COUNT).map(|_| ArrayQueue::new(retained)).collect();
        Self { classes }
    }

    /// The process-wide pool used when no explicit pool is configured.
    pub fn shared() -> Arc<BufferPool> {
        Arc::clone(&SHARED_POOL)
    }

    /// Rents an array of at least `min_len` bytes.
    ///
    /// The returned buffer may contain bytes written by a previous renter; callers
    /// track how much of it they have filled themselves.
    pub fn rent(self: &Arc<Self>, min_len: usize) -> PooledBuf {
        let buf = match class_index(min_len) {
            Some(idx) => self.classes[idx].pop().unwrap_or_else(|| vec![0; class_size(idx)]),
            None => {
                trace!(min_len, "requested size exceeds the largest class, allocating unpooled");
                vec![0; min_len]
            }
        };

        PooledBuf { buf, pool: Arc::clone(self) }
    }

    /// Number of idle arrays currently held for requests of `len` bytes.
    pub fn idle(&self, len: usize) -> usize {
        class_index(len).map_or(0, |idx| self.classes[idx].len())
    }

    fn give_back(&self, buf: Vec<u8>) {
        let len = buf.len();
        if !len.is_power_of_two() {
            return;
        }

        if let Some(idx) = class_index(len) {
            // a full class just lets the array drop
            let _ = self.classes[idx].push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let idle: Vec<usize> = self.classes.iter().map(ArrayQueue::len).collect();
        f.debug_struct("BufferPool").field("idle", &idle).finish()
    }
}

fn class_index(len: usize) -> Option<usize> {
    let size = len.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
    let shift = size.trailing_zeros();
    (shift <= MAX_CLASS_SHIFT).then(|| (shift - MIN_CLASS_SHIFT) as usize)
}

fn class_size(idx: usize) -> usize {
    1 << (MIN_CLASS_SHIFT as usize + idx)
}

/// An array rented from a [`BufferPool`], returned to it on drop.
pub struct PooledBuf {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuf {
    /// The pool this array goes back to.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuf").field("len", &self.buf.len()).finish_non_exhaustive()
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_rounds_up_to_class() {
        let pool = Arc::new(BufferPool::new());
        assert_eq!(pool.rent(1).len(), 512);
        assert_eq!(pool.rent(512).len(), 512);
        assert_eq!(pool.rent(513).len(), 1024);
        assert_eq!(pool.rent(8 * 1024).len(), 8 * 1024);
    }

    #[test]
    fn test_drop_returns_to_pool() {
        let pool = Arc::new(BufferPool::new());
        let buf = pool.rent(1000);
        let ptr = buf.as_ptr();
        assert_eq!(pool.idle(1000), 0);

        drop(buf);
        assert_eq!(pool.idle(1000), 1);

        let again = pool.rent(1024);
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.idle(1000), 0);
    }

    #[test]
    fn test_oversized_is_not_retained() {
        let pool = Arc::new(BufferPool::new());
        let buf = pool.rent((1 << MAX_CLASS_SHIFT) + 1);
        assert_eq!(buf.len(), (1 << MAX_CLASS_SHIFT) + 1);
        drop(buf);
        assert_eq!(pool.idle((1 << MAX_CLASS_SHIFT) + 1), 0);
    }

    #[test]
    fn test_retained_limit() {
        let pool = Arc::new(BufferPool::with_retained(1));
        let first = pool.rent(600);
        let second = pool.rent(600);
        drop(first);
        drop(second);
        assert_eq!(pool.idle(600), 1);
    }

    #[test]
    fn test_shared_pool_is_shared() {
        assert!(Arc::ptr_eq(&BufferPool::shared(), &BufferPool::shared()));
    }
}
