//! Chunked read cache over a seekable source.
//!
//! [`ChunkCache`] wraps one `Read + Seek` source and serves random-offset
//! reads from a bounded set of fixed-size chunks. It is meant for parsers
//! that hop around a large file reading small headers and tables: each hop
//! that lands in a resident chunk costs a memcpy instead of a syscall.
//!
//! ## Chunks
//! ```text
//! chunk index = position / chunk_len
//! chunk offset = position % chunk_len
//! ```
//! A chunk holds the source bytes `[index * chunk_len, index * chunk_len +
//! valid)`. `valid < chunk_len` only for the final chunk of the source.
//!
//! ## Replacement
//! Resident chunks are ordered in a [`RecencyList`], front = most recently
//! used. A hit promotes the chunk to the front. A miss allocates a new chunk
//! while fewer than `chunk_count` are resident, otherwise it evicts the back
//! (least recently used) chunk and refills its buffer in place.
//!
//! ## Large reads
//! A single read longer than the large-read threshold skips the cache and
//! reads the source directly at the cursor. It neither populates nor evicts
//! chunks.
//!
//! ## End of source
//! The source length is learned on the first miss (and refreshed by
//! [`ChunkCache::len`]). Lookups at or beyond it return no data without
//! counting a miss or evicting anything.
//!
//! ## Errors
//! A read that fails after some bytes were already copied returns that
//! partial count; the next read reports the error.
//!
//! ## Threading
//! Not synchronized. One instance belongs to one processing context.

use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::pool::{BufferPool, PooledBuffer};
use crate::recency::RecencyList;
use crate::utils::{offset_position, read_full_at};
use crate::{Error, Result};

/// Where chunk buffers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Allocation {
    /// Rent from a [`BufferPool`]; buffers go back to it when the cache is
    /// dropped.
    #[default]
    Pooled,
    /// Allocate dedicated buffers, for caches that live for the whole
    /// process.
    Dedicated,
}

/// Construction parameters for [`ChunkCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheOptions {
    pub allocation: Allocation,
    /// Maximum number of resident chunks (at least 1).
    pub chunk_count: usize,
    /// Bytes per chunk (at least 1).
    pub chunk_len: usize,
    /// Reads longer than this bypass the cache. [`None`] means `chunk_len`;
    /// larger values are clamped to `chunk_len`.
    pub large_read_threshold: Option<usize>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            allocation: Allocation::Pooled,
            chunk_count: 32,
            chunk_len: 4096,
            large_read_threshold: None,
        }
    }
}

impl CacheOptions {
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len;
        self
    }

    pub fn with_large_read_threshold(mut self, threshold: usize) -> Self {
        self.large_read_threshold = Some(threshold);
        self
    }
}

/// Counters describing how a [`ChunkCache`] has served reads so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Chunk lookups satisfied by a resident chunk.
    pub hits: u64,
    /// Chunk lookups that had to read the source.
    pub misses: u64,
    /// Misses that recycled the least recently used chunk.
    pub evictions: u64,
    /// Reads that bypassed the cache entirely.
    pub bypass_reads: u64,
}

/// One resident chunk.
#[derive(Debug)]
struct Chunk {
    index: u64,
    valid: usize,
    buf: PooledBuffer,
}

impl Chunk {
    #[inline]
    fn bytes(&self) -> &[u8] {
        &self.buf[..self.valid]
    }
}

/// Random-access read cache over a seekable source.
///
/// Implements [`Read`], [`Seek`] and [`BufRead`]. [`Write`] is implemented
/// only to report [`io::ErrorKind::Unsupported`].
pub struct ChunkCache<R> {
    source: R,
    chunks: RecencyList<Chunk>,
    allocation: Allocation,
    pool: Arc<BufferPool>,
    chunk_len: usize,
    large_read_threshold: usize,
    position: u64,
    /// Source length as last observed.
    end: Option<u64>,
    stats: CacheStats,
}

impl<R: Read + Seek> ChunkCache<R> {
    /// Wrap `source` using the shared buffer pool.
    ///
    /// Returns [`Error::InvalidArgument`] for a zero chunk count or chunk
    /// length, or when the source cannot report its position (i.e. is not
    /// actually seekable, such as a pipe behind a `File`).
    pub fn new(source: R, options: CacheOptions) -> Result<Self> {
        Self::with_pool(source, options, Arc::clone(BufferPool::shared()))
    }

    /// Wrap `source`, renting pooled chunk buffers from `pool`.
    pub fn with_pool(mut source: R, options: CacheOptions, pool: Arc<BufferPool>) -> Result<Self> {
        if options.chunk_count == 0 {
            return Err(Error::InvalidArgument("chunk count must be at least 1"));
        }
        if options.chunk_len == 0 {
            return Err(Error::InvalidArgument("chunk length must be at least 1"));
        }
        if source.stream_position().is_err() {
            return Err(Error::InvalidArgument(
                "cannot create a chunk cache over a non-seekable source",
            ));
        }
        let large_read_threshold = options
            .large_read_threshold
            .unwrap_or(options.chunk_len)
            .min(options.chunk_len);

        debug!(
            chunk_count = options.chunk_count,
            chunk_len = options.chunk_len,
            large_read_threshold,
            allocation = ?options.allocation,
            "created chunk cache"
        );

        Ok(Self {
            source,
            chunks: RecencyList::with_capacity(options.chunk_count),
            allocation: options.allocation,
            pool,
            chunk_len: options.chunk_len,
            large_read_threshold,
            position: 0,
            end: None,
            stats: CacheStats::default(),
        })
    }

    /// Logical cursor.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the logical cursor. Positions past the end are allowed; reads
    /// there return 0.
    #[inline]
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.capacity()
    }

    /// Number of chunks currently resident.
    pub fn resident_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn large_read_threshold(&self) -> usize {
        self.large_read_threshold
    }

    /// Set the large-read threshold, clamped to `[0, chunk_len]`.
    pub fn set_large_read_threshold(&mut self, threshold: usize) {
        self.large_read_threshold = threshold.min(self.chunk_len);
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Length of the underlying source in bytes.
    ///
    /// Moves the source's own cursor, which the cache never relies on.
    pub fn len(&mut self) -> io::Result<u64> {
        let len = self.source.seek(SeekFrom::End(0))?;
        self.end = Some(len);
        Ok(len)
    }

    pub fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Always fails: the cache is a read-only view.
    pub fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::Unsupported("cannot resize a chunk cache"))
    }

    /// Borrow the wrapped source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutably borrow the wrapped source.
    ///
    /// Resident chunks are not invalidated; call [`len`](Self::len) after
    /// the source grows.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Release every chunk and return the wrapped source.
    ///
    /// Pooled buffers go back to their pool here, once; the cache cannot be
    /// used afterwards because it has been consumed.
    pub fn into_inner(mut self) -> R {
        self.chunks.clear();
        // Chunks are gone; the remaining fields need no cleanup.
        let Self { source, .. } = self;
        source
    }

    /// Make the chunk covering `index` resident at the front of the recency
    /// order and return it, or [`None`] when the chunk starts at or past the
    /// end of the source.
    fn load(&mut self, index: u64) -> io::Result<Option<&Chunk>> {
        if let Some(i) = self.chunks.iter().position(|c| c.index == index) {
            self.stats.hits += 1;
            if i != 0 {
                let chunk = self.chunks.remove_at(i);
                if self.chunks.push_front(chunk).is_err() {
                    unreachable!("a slot was freed by the removal");
                }
            }
            return Ok(Some(&self.chunks[0]));
        }

        let start = index * self.chunk_len as u64;
        let end = match self.end {
            Some(end) => end,
            None => self.len()?,
        };
        if start >= end {
            trace!(chunk = index, end, "chunk lookup past end of source");
            return Ok(None);
        }

        self.stats.misses += 1;
        let buf = if self.chunks.is_full() {
            let Some(victim) = self.chunks.pop_back() else {
                unreachable!("a full cache has at least one chunk");
            };
            self.stats.evictions += 1;
            trace!(evicted = victim.index, loaded = index, "chunk cache eviction");
            victim.buf
        } else {
            match self.allocation {
                Allocation::Pooled => self.pool.rent(self.chunk_len),
                Allocation::Dedicated => PooledBuffer::dedicated(self.chunk_len),
            }
        };

        let mut chunk = Chunk {
            index,
            valid: 0,
            buf,
        };
        chunk.valid = read_full_at(&mut self.source, start, &mut chunk.buf)?;
        trace!(chunk = index, valid = chunk.valid, "chunk cache miss");

        if self.chunks.push_front(chunk).is_err() {
            unreachable!("a slot was freed or available before loading");
        }
        Ok(Some(&self.chunks[0]))
    }

    fn read_direct(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stats.bypass_reads += 1;
        let n = read_full_at(&mut self.source, self.position, buf)?;
        trace!(position = self.position, requested = buf.len(), read = n, "chunk cache bypass");
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Read for ChunkCache<R> {
    /// Read up to `buf.len()` bytes at the cursor.
    ///
    /// Stops early, without error, at the end of the source or when a later
    /// chunk fails to load after earlier ones were copied.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if buf.len() > self.large_read_threshold {
            return self.read_direct(buf);
        }

        let chunk_len = self.chunk_len;
        let mut total = 0;
        while total < buf.len() {
            let position = self.position;
            let offset = (position % chunk_len as u64) as usize;
            let chunk = match self.load(position / chunk_len as u64) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) if total > 0 => {
                    debug!(position, copied = total, error = %e, "chunk load failed mid-read");
                    break;
                }
                Err(e) => return Err(e),
            };
            if offset >= chunk.valid {
                break;
            }
            let n = (chunk.valid - offset).min(buf.len() - total);
            buf[total..total + n].copy_from_slice(&chunk.bytes()[offset..offset + n]);
            let short_chunk = chunk.valid < chunk_len;
            total += n;
            self.position += n as u64;
            if short_chunk {
                // Final chunk of the source; nothing lies beyond it.
                break;
            }
        }
        Ok(total)
    }
}

impl<R: Read + Seek> BufRead for ChunkCache<R> {
    /// Borrow the rest of the chunk under the cursor without copying.
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let chunk_len = self.chunk_len as u64;
        let offset = (self.position % chunk_len) as usize;
        let index = self.position / chunk_len;
        let Some(chunk) = self.load(index)? else {
            return Ok(&[]);
        };
        let bytes = chunk.bytes();
        Ok(&bytes[offset.min(bytes.len())..])
    }

    fn consume(&mut self, amt: usize) {
        self.position += amt as u64;
    }
}

impl<R: Read + Seek> Seek for ChunkCache<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::Current(delta) => offset_position(self.position, delta)?,
            SeekFrom::End(delta) => {
                let len = self.len()?;
                offset_position(len, delta)?
            }
        };
        Ok(self.position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl<R> Write for ChunkCache<R> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(Error::Unsupported("cannot write to a chunk cache").into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<R> std::fmt::Debug for ChunkCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkCache")
            .field("position", &self.position)
            .field("chunk_len", &self.chunk_len)
            .field("resident", &self.chunks.len())
            .field("chunk_count", &self.chunks.capacity())
            .field("stats", &self.stats)
            .finish()
    }
}
