//! Scenario tests for `StreamMatcher`.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use rekit::matcher::{self, MatchOptions, StreamMatcher};
use rekit::{CacheOptions, ChunkCache, Error};

/// Fails every read once the cursor passes `fail_at`.
struct Faulty {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
}

impl Read for Faulty {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.inner.position() >= self.fail_at {
            return Err(io::Error::other("device gone"));
        }
        let room = (self.fail_at - self.inner.position()) as usize;
        let n = buf.len().min(room);
        self.inner.read(&mut buf[..n])
    }
}

impl Seek for Faulty {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn abc_repeated_with_tiny_windows() {
    let mut src = Cursor::new(b"ABCABCABC".to_vec());
    let m = StreamMatcher::new("ABC", MatchOptions::default().with_buffer_len(4)).unwrap();
    let found = m.find_all(&mut src, ..).unwrap();
    assert_eq!(found, [0, 3, 6]);
    assert!(found.windows(2).all(|w| w[1] - w[0] == 3));
}

#[test]
fn overlapping_candidates_yield_one_match() {
    let mut src = Cursor::new(b"AAA".to_vec());
    assert_eq!(matcher::find_all(&mut src, .., "AA").unwrap(), [0]);
}

#[test]
fn searches_through_a_chunk_cache() {
    let mut data = vec![0u8; 20_000];
    for &at in &[5u64, 4094, 8191, 19_990] {
        data[at as usize..at as usize + 4].copy_from_slice(b"MAGC");
    }
    let options = CacheOptions::default().with_chunk_count(2).with_chunk_len(4096);
    let mut cache = ChunkCache::new(Cursor::new(data), options).unwrap();
    cache.set_position(1234);

    let m = StreamMatcher::new(b"MAGC", MatchOptions::default().with_buffer_len(1000)).unwrap();
    assert_eq!(m.find_all(&mut cache, ..).unwrap(), [5, 4094, 8191, 19_990]);
    assert_eq!(m.find_first(&mut cache, 6..).unwrap(), Some(4094));
    assert_eq!(m.find_last(&mut cache, ..19_993).unwrap(), Some(8191));
    assert_eq!(cache.position(), 1234);
}

#[test]
fn lazy_iteration_stops_reading_early() {
    let mut data = vec![b'.'; 1 << 16];
    data[10..12].copy_from_slice(b"!!");
    let mut src = Cursor::new(data);
    let m = StreamMatcher::new("!!", MatchOptions::default().with_buffer_len(64)).unwrap();

    let mut it = m.matches(&mut src, ..).unwrap();
    assert_eq!(it.next().unwrap().unwrap(), 10);
    drop(it);
    assert_eq!(src.position(), 0);
}

#[test]
fn io_errors_surface_and_position_is_restored() {
    let mut data = vec![0u8; 4096];
    data[100..103].copy_from_slice(b"KEY");
    let mut src = Faulty {
        inner: Cursor::new(data),
        fail_at: 1000,
    };
    src.inner.set_position(7);

    let m = StreamMatcher::new("KEY", MatchOptions::default().with_buffer_len(256)).unwrap();
    let results: Vec<_> = m.matches(&mut src, ..).unwrap().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &100);
    assert!(matches!(results[1], Err(Error::Io(_))));
    assert_eq!(src.inner.position(), 7);
}

#[test]
fn empty_segments_find_nothing() {
    let mut src = Cursor::new(b"needle".to_vec());
    assert_eq!(matcher::find_first(&mut src, 3..3, "d").unwrap(), None);
    assert_eq!(matcher::find_first(&mut src, 100.., "d").unwrap(), None);
    assert_eq!(matcher::find_first(&mut src, .., "needles").unwrap(), None);
    assert_eq!(matcher::find_first(&mut src, .., "needle").unwrap(), Some(0));
}

#[test]
fn invalid_arguments() {
    let mut src = Cursor::new(b"x".to_vec());
    assert!(matches!(
        matcher::find_all(&mut src, .., b""),
        Err(Error::InvalidArgument(_))
    ));
    let options = MatchOptions::default().with_max_matches(0);
    assert!(matches!(
        StreamMatcher::new("x", options),
        Err(Error::InvalidArgument(_))
    ));
}
