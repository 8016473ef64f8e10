//! Size-classed byte buffer pool.
//!
//! Chunk buffers for [`crate::cache::ChunkCache`] and the scan windows used by
//! [`crate::matcher`] are rented from a [`BufferPool`] so that repeatedly
//! opening caches and running searches does not churn the allocator.
//!
//! A [`PooledBuffer`] returns itself to its pool exactly once, when dropped.
//! Ownership makes a double return impossible: the buffer is moved into the
//! pool and the handle is gone.
//!
//! ## Size classes
//! Requests are rounded up to the next power of two (minimum 256 bytes).
//! Each class keeps at most [`BufferPool::MAX_RETAINED`] idle buffers; extra
//! returns are simply freed.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, OnceLock};

/// Smallest size class, as a power of two.
const MIN_CLASS_SHIFT: u32 = 8;
/// Number of size classes (256 B .. 128 MiB).
const CLASS_COUNT: usize = 20;

/// Thread-safe pool of reusable byte buffers.
pub struct BufferPool {
    classes: [Mutex<Vec<Box<[u8]>>>; CLASS_COUNT],
}

impl BufferPool {
    /// Idle buffers retained per size class.
    pub const MAX_RETAINED: usize = 64;

    pub fn new() -> Self {
        Self {
            classes: std::array::from_fn(|_| Mutex::new(Vec::new())),
        }
    }

    /// Process-wide pool used when callers do not supply their own.
    pub fn shared() -> &'static Arc<BufferPool> {
        static SHARED: OnceLock<Arc<BufferPool>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(BufferPool::new()))
    }

    /// Size class index and capacity for a request of `len` bytes.
    ///
    /// Returns [`None`] when the request exceeds the largest class.
    fn class_of(len: usize) -> Option<(usize, usize)> {
        let cap = len.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
        let class = (cap.trailing_zeros() - MIN_CLASS_SHIFT) as usize;
        (class < CLASS_COUNT).then_some((class, cap))
    }

    /// Rent a buffer of exactly `len` visible bytes.
    ///
    /// The contents are unspecified (a recycled buffer keeps its old bytes).
    pub fn rent(self: &Arc<Self>, len: usize) -> PooledBuffer {
        let Some((class, cap)) = Self::class_of(len) else {
            // Oversized requests bypass the pool entirely.
            return PooledBuffer::dedicated(len);
        };
        let recycled = self.classes[class]
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop());
        let data = recycled.unwrap_or_else(|| vec![0u8; cap].into_boxed_slice());
        debug_assert_eq!(data.len(), cap);
        PooledBuffer {
            data,
            len,
            home: Some(Arc::clone(self)),
        }
    }

    fn give_back(&self, data: Box<[u8]>) {
        let Some((class, cap)) = Self::class_of(data.len()) else {
            return;
        };
        if cap != data.len() {
            return;
        }
        if let Ok(mut idle) = self.classes[class].lock() {
            if idle.len() < Self::MAX_RETAINED {
                idle.push(data);
            }
        }
    }

    /// Number of idle buffers currently retained across all classes.
    pub fn idle_count(&self) -> usize {
        self.classes
            .iter()
            .map(|c| c.lock().map(|idle| idle.len()).unwrap_or(0))
            .sum()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// A byte buffer that is either rented from a [`BufferPool`] or owned
/// outright.
///
/// Dereferences to exactly the requested length.
pub struct PooledBuffer {
    data: Box<[u8]>,
    len: usize,
    home: Option<Arc<BufferPool>>,
}

impl PooledBuffer {
    /// Allocate a zeroed buffer that is never returned to a pool.
    pub fn dedicated(len: usize) -> Self {
        Self {
            data: vec![0u8; len].into_boxed_slice(),
            len,
            home: None,
        }
    }

    /// Whether dropping this buffer returns it to a pool.
    pub fn is_pooled(&self) -> bool {
        self.home.is_some()
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.home.take() {
            pool.give_back(std::mem::take(&mut self.data));
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len)
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_classes_round_up() {
        assert_eq!(BufferPool::class_of(0), Some((0, 256)));
        assert_eq!(BufferPool::class_of(256), Some((0, 256)));
        assert_eq!(BufferPool::class_of(257), Some((1, 512)));
        assert_eq!(BufferPool::class_of(4096), Some((4, 4096)));
        assert_eq!(BufferPool::class_of(usize::MAX), None);
    }

    #[test]
    fn rent_exposes_requested_length() {
        let pool = Arc::new(BufferPool::new());
        let buf = pool.rent(1000);
        assert_eq!(buf.len(), 1000);
        assert!(buf.is_pooled());
    }

    #[test]
    fn drop_returns_exactly_once() {
        let pool = Arc::new(BufferPool::new());
        {
            let a = pool.rent(4096);
            let b = pool.rent(4096);
            assert_eq!(pool.idle_count(), 0);
            drop(a);
            assert_eq!(pool.idle_count(), 1);
            drop(b);
        }
        assert_eq!(pool.idle_count(), 2);

        // Renting again reuses an idle buffer.
        let c = pool.rent(3000);
        assert_eq!(pool.idle_count(), 1);
        drop(c);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn dedicated_buffers_bypass_pool() {
        let pool = Arc::new(BufferPool::new());
        let buf = PooledBuffer::dedicated(64);
        assert!(!buf.is_pooled());
        assert!(buf.iter().all(|&b| b == 0));
        drop(buf);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn retention_is_bounded() {
        let pool = Arc::new(BufferPool::new());
        let held: Vec<_> = (0..BufferPool::MAX_RETAINED + 5)
            .map(|_| pool.rent(512))
            .collect();
        drop(held);
        assert_eq!(pool.idle_count(), BufferPool::MAX_RETAINED);
    }
}
