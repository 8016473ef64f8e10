//! Scenario tests for `ChunkCache` against instrumented sources.

use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

use rekit::{Allocation, BufferPool, CacheOptions, ChunkCache, Error};

/// Cursor that counts how often the cache goes to the source.
struct Counting {
    inner: Cursor<Vec<u8>>,
    reads: usize,
    seeks: usize,
}

impl Counting {
    fn new(data: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(data),
            reads: 0,
            seeks: 0,
        }
    }
}

impl Read for Counting {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        self.inner.read(buf)
    }
}

impl Seek for Counting {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks += 1;
        self.inner.seek(pos)
    }
}

/// A source that claims `Seek` but cannot actually seek, like a pipe.
struct Pipe;

impl Read for Pipe {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Seek for Pipe {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "illegal seek"))
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8 ^ (i >> 8) as u8).collect()
}

fn options(count: usize, len: usize) -> CacheOptions {
    CacheOptions::default().with_chunk_count(count).with_chunk_len(len)
}

#[test]
fn read_spanning_chunk_boundary_matches_direct_read() {
    let data = pattern(8192);
    let mut cache = ChunkCache::new(Cursor::new(data.clone()), options(2, 4096)).unwrap();

    cache.seek(SeekFrom::Start(4000)).unwrap();
    let mut cached = [0u8; 256];
    assert_eq!(cache.read(&mut cached).unwrap(), 256);

    let mut direct = Cursor::new(data);
    direct.seek(SeekFrom::Start(4000)).unwrap();
    let mut expected = [0u8; 256];
    direct.read_exact(&mut expected).unwrap();

    assert_eq!(cached, expected);
    assert_eq!(cache.position(), 4256);
    assert_eq!(cache.resident_chunks(), 2);
}

#[test]
fn hits_do_not_touch_the_source() {
    let mut cache = ChunkCache::new(Counting::new(pattern(4096)), options(4, 1024)).unwrap();
    let mut buf = [0u8; 16];
    cache.read_exact(&mut buf).unwrap();
    let (reads, seeks) = (cache.get_ref().reads, cache.get_ref().seeks);

    for offset in (16..1000).step_by(16) {
        cache.set_position(offset);
        cache.read_exact(&mut buf).unwrap();
    }
    assert_eq!(cache.get_ref().reads, reads);
    assert_eq!(cache.get_ref().seeks, seeks);
    assert_eq!(cache.stats().misses, 1);
    assert!(cache.stats().hits >= 62);
}

#[test]
fn eviction_follows_recency() {
    let data = pattern(400);
    let mut cache = ChunkCache::with_pool(
        Cursor::new(data),
        options(2, 100),
        Arc::new(BufferPool::new()),
    )
    .unwrap();
    let mut byte = [0u8; 1];
    let mut touch = |cache: &mut ChunkCache<Cursor<Vec<u8>>>, offset: u64| {
        cache.set_position(offset);
        cache.read_exact(&mut byte).unwrap();
    };

    touch(&mut cache, 0); // miss: [0]
    touch(&mut cache, 100); // miss: [1, 0]
    touch(&mut cache, 50); // hit: [0, 1]
    touch(&mut cache, 250); // miss, evicts 1: [2, 0]
    touch(&mut cache, 10); // hit
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.evictions), (2, 3, 1));

    touch(&mut cache, 150); // chunk 1 was evicted
    assert_eq!(cache.stats().misses, 4);
    assert_eq!(cache.stats().evictions, 2);
}

#[test]
fn large_reads_bypass_and_advance_by_bytes_read() {
    let data = pattern(1000);
    let mut cache = ChunkCache::new(
        Cursor::new(data.clone()),
        options(2, 64).with_large_read_threshold(32),
    )
    .unwrap();

    cache.set_position(900);
    let mut buf = [0u8; 200];
    assert_eq!(cache.read(&mut buf).unwrap(), 100);
    assert_eq!(&buf[..100], &data[900..]);
    assert_eq!(cache.position(), 1000);
    assert_eq!(cache.stats().bypass_reads, 1);
    assert_eq!(cache.resident_chunks(), 0);
}

#[test]
fn reads_past_end_return_zero() {
    let mut cache = ChunkCache::new(Cursor::new(pattern(100)), options(2, 64)).unwrap();
    cache.set_position(500);
    let mut buf = [0u8; 8];
    assert_eq!(cache.read(&mut buf).unwrap(), 0);

    cache.set_position(96);
    assert_eq!(cache.read(&mut buf).unwrap(), 4);
    assert_eq!(cache.read(&mut buf).unwrap(), 0);
}

#[test]
fn seeking_supports_every_origin() {
    let mut cache = ChunkCache::new(Cursor::new(pattern(300)), CacheOptions::default()).unwrap();
    assert_eq!(cache.seek(SeekFrom::Start(10)).unwrap(), 10);
    assert_eq!(cache.seek(SeekFrom::Current(5)).unwrap(), 15);
    assert_eq!(cache.seek(SeekFrom::Current(-15)).unwrap(), 0);
    assert_eq!(cache.seek(SeekFrom::End(-1)).unwrap(), 299);
    assert_eq!(cache.len().unwrap(), 300);

    let err = cache.seek(SeekFrom::Current(-1000)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert_eq!(cache.position(), 299);
}

#[test]
fn rejects_bad_construction() {
    assert!(matches!(
        ChunkCache::new(Cursor::new(Vec::new()), options(0, 64)),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        ChunkCache::new(Cursor::new(Vec::new()), options(1, 0)),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        ChunkCache::new(Pipe, CacheOptions::default()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn buf_read_lines_cross_chunks() {
    let text = b"first line\nsecond, rather longer line\nthird\n".to_vec();
    let mut cache = ChunkCache::new(Cursor::new(text), options(2, 7)).unwrap();
    let lines: Vec<String> = (&mut cache).lines().map(|l| l.unwrap()).collect();
    assert_eq!(lines, ["first line", "second, rather longer line", "third"]);
}

#[test]
fn into_inner_returns_pooled_buffers_once() {
    let pool = Arc::new(BufferPool::new());
    let mut cache =
        ChunkCache::with_pool(Cursor::new(pattern(1000)), options(3, 256), Arc::clone(&pool)).unwrap();
    let mut buf = vec![0u8; 1000];
    for piece in buf.chunks_mut(100) {
        cache.read_exact(piece).unwrap();
    }
    assert_eq!(cache.resident_chunks(), 3);
    assert_eq!(pool.idle_count(), 0);

    let source = cache.into_inner();
    assert_eq!(source.get_ref().len(), 1000);
    assert_eq!(pool.idle_count(), 3);
}

#[test]
fn dedicated_allocation_bypasses_pool() {
    let pool = Arc::new(BufferPool::new());
    let opts = options(2, 256).with_allocation(Allocation::Dedicated);
    let mut cache = ChunkCache::with_pool(Cursor::new(pattern(600)), opts, Arc::clone(&pool)).unwrap();
    let mut buf = vec![0u8; 600];
    for piece in buf.chunks_mut(100) {
        cache.read_exact(piece).unwrap();
    }
    assert_eq!(cache.resident_chunks(), 2);
    drop(cache);
    assert_eq!(pool.idle_count(), 0);
}

/// Serves bytes up to `fail_at`, then fails every read.
struct FailsAt {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
}

impl Read for FailsAt {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.inner.position();
        if position >= self.fail_at {
            return Err(io::Error::other("media error"));
        }
        let n = buf.len().min((self.fail_at - position) as usize);
        self.inner.read(&mut buf[..n])
    }
}

impl Seek for FailsAt {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn failure_after_copied_bytes_returns_partial_count() {
    let data = pattern(64);
    let source = FailsAt {
        inner: Cursor::new(data.clone()),
        fail_at: 16,
    };
    let mut cache = ChunkCache::new(source, options(2, 16)).unwrap();
    cache.set_position(8);

    let mut buf = [0u8; 12];
    assert_eq!(cache.read(&mut buf).unwrap(), 8);
    assert_eq!(&buf[..8], &data[8..16]);
    assert_eq!(cache.position(), 16);

    let err = cache.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert_eq!(cache.position(), 16);
}
