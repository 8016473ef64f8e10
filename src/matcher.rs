//! Bounded-memory pattern search over a stream segment.
//!
//! Locating structural markers (table magics, chunk tags, string pools) in a
//! multi-gigabyte container must not load the container. [`StreamMatcher`]
//! scans an arbitrary segment of a `Read + Seek` source using two
//! alternating windows, so memory use depends only on the window size.
//!
//! ## Windows
//! ```text
//!            older window            latest window
//!   [start_o ............)[start_l ............)
//!                  ^ cursor        covered_end ^
//! ```
//! Both windows are `max(pattern_len, buffer_len)` bytes and together form a
//! logical ring of twice that length. A candidate position is compared once
//! `cursor + pattern_len <= covered_end`, reading across the window boundary
//! when needed. When the scan needs bytes past `covered_end`, the older
//! window (already fully behind the cursor) is refilled with the bytes that
//! immediately follow the latest window, and the roles swap.
//!
//! ## Match policy
//! Matches do not overlap: after a match the cursor jumps past the whole
//! pattern, so `"AA"` occurs once in `"AAA"` (at offset 0). After a
//! mismatch the cursor advances one byte.
//!
//! ## Termination
//! The scan ends at the segment's upper bound, when the source runs dry, or
//! after `max_matches` matches.
//!
//! ## Source position
//! The source's position is captured when a scan starts and restored when
//! the [`Matches`] iterator is dropped, whether it ran to completion, was
//! abandoned early, or stopped on an error. Rented windows are returned to
//! the pool at the same moment.

use std::io::{Read, Seek, SeekFrom};
use std::ops::{Bound, RangeBounds};

use tracing::{trace, warn};

use crate::pool::{BufferPool, PooledBuffer};
use crate::utils::read_full;
use crate::{Error, Result};

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchOptions {
    /// Minimum window length; the pattern length wins if it is larger.
    pub buffer_len: usize,
    /// Stop after this many matches (at least 1).
    pub max_matches: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            buffer_len: 4096,
            max_matches: usize::MAX,
        }
    }
}

impl MatchOptions {
    pub fn with_buffer_len(mut self, buffer_len: usize) -> Self {
        self.buffer_len = buffer_len;
        self
    }

    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }
}

/// A validated pattern plus search options, reusable across streams.
#[derive(Debug, Clone)]
pub struct StreamMatcher {
    pattern: Vec<u8>,
    options: MatchOptions,
}

impl StreamMatcher {
    /// Returns [`Error::InvalidArgument`] for an empty pattern or
    /// `max_matches == 0`.
    pub fn new<P: AsRef<[u8]>>(pattern: P, options: MatchOptions) -> Result<Self> {
        let pattern = pattern.as_ref();
        if pattern.is_empty() {
            return Err(Error::InvalidArgument("pattern must not be empty"));
        }
        if options.max_matches < 1 {
            return Err(Error::InvalidArgument("max_matches must be at least 1"));
        }
        Ok(Self {
            pattern: pattern.to_vec(),
            options,
        })
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Window length used for each of the two scan windows.
    pub fn window_len(&self) -> usize {
        self.options.buffer_len.max(self.pattern.len())
    }

    /// Lazily enumerate match offsets within `range` of `source`.
    ///
    /// Offsets are absolute and strictly ascending. Dropping the iterator
    /// restores the source position.
    pub fn matches<'a, R, B>(&'a self, source: &'a mut R, range: B) -> Result<Matches<'a, R>>
    where
        R: Read + Seek,
        B: RangeBounds<u64>,
    {
        let lower = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let upper = match range.end_bound() {
            Bound::Included(&n) => n.saturating_add(1),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => u64::MAX,
        };
        let restore = source.stream_position()?;
        let pool = BufferPool::shared();
        let window_len = self.window_len();
        trace!(lower, upper, pattern_len = self.pattern.len(), window_len, "starting stream match");

        Ok(Matches {
            source,
            restore,
            pattern: &self.pattern,
            windows: [pool.rent(window_len), pool.rent(window_len)],
            starts: [lower; 2],
            filled: [0; 2],
            latest: 0,
            loaded: false,
            exhausted: false,
            next_fill: lower,
            cursor: lower,
            upper,
            remaining: self.options.max_matches,
            done: false,
        })
    }

    /// Collect every match offset within `range`, ascending.
    pub fn find_all<R, B>(&self, source: &mut R, range: B) -> Result<Vec<u64>>
    where
        R: Read + Seek,
        B: RangeBounds<u64>,
    {
        self.matches(source, range)?.collect()
    }

    /// First match within `range`, if any.
    pub fn find_first<R, B>(&self, source: &mut R, range: B) -> Result<Option<u64>>
    where
        R: Read + Seek,
        B: RangeBounds<u64>,
    {
        self.matches(source, range)?.next().transpose()
    }

    /// Last match within `range`, if any.
    ///
    /// Scans the whole segment (subject to `max_matches`).
    pub fn find_last<R, B>(&self, source: &mut R, range: B) -> Result<Option<u64>>
    where
        R: Read + Seek,
        B: RangeBounds<u64>,
    {
        let mut last = None;
        for m in self.matches(source, range)? {
            last = Some(m?);
        }
        Ok(last)
    }
}

/// Collect every occurrence of `pattern` within `range` using default
/// options.
pub fn find_all<R, P, B>(source: &mut R, range: B, pattern: P) -> Result<Vec<u64>>
where
    R: Read + Seek,
    P: AsRef<[u8]>,
    B: RangeBounds<u64>,
{
    StreamMatcher::new(pattern, MatchOptions::default())?.find_all(source, range)
}

/// First occurrence of `pattern` within `range`.
pub fn find_first<R, P, B>(source: &mut R, range: B, pattern: P) -> Result<Option<u64>>
where
    R: Read + Seek,
    P: AsRef<[u8]>,
    B: RangeBounds<u64>,
{
    let options = MatchOptions::default().with_max_matches(1);
    StreamMatcher::new(pattern, options)?.find_first(source, range)
}

/// Last occurrence of `pattern` within `range`.
pub fn find_last<R, P, B>(source: &mut R, range: B, pattern: P) -> Result<Option<u64>>
where
    R: Read + Seek,
    P: AsRef<[u8]>,
    B: RangeBounds<u64>,
{
    StreamMatcher::new(pattern, MatchOptions::default())?.find_last(source, range)
}

/// Lazy iterator over match offsets. See the [module docs](self).
pub struct Matches<'a, R: Read + Seek> {
    source: &'a mut R,
    restore: u64,
    pattern: &'a [u8],
    windows: [PooledBuffer; 2],
    /// Absolute offset of each window's first byte.
    starts: [u64; 2],
    /// Valid bytes in each window.
    filled: [usize; 2],
    /// Window holding the highest offsets.
    latest: usize,
    loaded: bool,
    exhausted: bool,
    next_fill: u64,
    cursor: u64,
    upper: u64,
    remaining: usize,
    done: bool,
}

impl<R: Read + Seek> Matches<'_, R> {
    /// One past the last absolute offset held in the windows.
    #[inline]
    fn covered_end(&self) -> u64 {
        if self.loaded {
            self.starts[self.latest] + self.filled[self.latest] as u64
        } else {
            self.cursor
        }
    }

    /// Load the next window's worth of bytes. Returns `false` when nothing
    /// more can be read.
    fn refill(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let target = if self.loaded { 1 - self.latest } else { 0 };
        // The window being recycled must lie entirely behind the cursor.
        debug_assert!(!self.loaded || self.cursor >= self.starts[self.latest]);

        let window_len = self.windows[target].len() as u64;
        let want = (self.upper - self.next_fill).min(window_len) as usize;
        if want == 0 {
            return Ok(false);
        }
        self.source.seek(SeekFrom::Start(self.next_fill))?;
        let n = read_full(&mut *self.source, &mut self.windows[target][..want])?;
        trace!(start = self.next_fill, requested = want, read = n, "refilled match window");
        if n < want {
            self.exhausted = true;
        }
        if n == 0 {
            return Ok(false);
        }

        self.starts[target] = self.next_fill;
        self.filled[target] = n;
        self.latest = target;
        self.loaded = true;
        self.next_fill += n as u64;
        Ok(true)
    }

    /// Compare the pattern against the windows at absolute offset `pos`.
    fn matches_at(&self, pos: u64) -> bool {
        let p = self.pattern;
        let latest = self.latest;
        let latest_start = self.starts[latest];
        if pos >= latest_start {
            let off = (pos - latest_start) as usize;
            return self.windows[latest][off..off + p.len()] == *p;
        }
        let older = 1 - latest;
        let off = (pos - self.starts[older]) as usize;
        let head = ((latest_start - pos) as usize).min(p.len());
        self.windows[older][off..off + head] == p[..head]
            && self.windows[latest][..p.len() - head] == p[head..]
    }

    fn advance(&mut self) -> Result<Option<u64>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let p = self.pattern.len() as u64;
        let first = self.pattern[0];
        loop {
            let end = self.cursor.saturating_add(p);
            if end > self.upper {
                return Ok(None);
            }
            if end > self.covered_end() {
                if !self.refill()? {
                    return Ok(None);
                }
                continue;
            }
            if self.byte_at(self.cursor) == first && self.matches_at(self.cursor) {
                let at = self.cursor;
                self.cursor = end;
                self.remaining -= 1;
                trace!(offset = at, "pattern match");
                return Ok(Some(at));
            }
            self.cursor += 1;
        }
    }

    #[inline]
    fn byte_at(&self, pos: u64) -> u8 {
        let w = if pos >= self.starts[self.latest] {
            self.latest
        } else {
            1 - self.latest
        };
        self.windows[w][(pos - self.starts[w]) as usize]
    }
}

impl<R: Read + Seek> Iterator for Matches<'_, R> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Result<u64>> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(at)) => Some(Ok(at)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> Drop for Matches<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.source.seek(SeekFrom::Start(self.restore)) {
            warn!(position = self.restore, error = %e, "failed to restore source position after match");
        }
    }
}
