//! Low-level I/O primitives shared by the cache, matcher and codec.
//!
//! Unlike [`Read::read_exact`], these helpers tolerate a source that ends
//! early: they report how many bytes actually arrived and leave the
//! short-read decision to the caller.

use std::io::{self, Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Read into `buf` until it is full or the source returns 0.
///
/// Retries on [`io::ErrorKind::Interrupted`]. Returns the number of bytes
/// read, which is less than `buf.len()` only at end of stream.
pub(crate) fn read_full<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match r.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Seek to `offset` and then [`read_full`].
pub(crate) fn read_full_at<R: Read + Seek + ?Sized>(
    r: &mut R,
    offset: u64,
    buf: &mut [u8],
) -> io::Result<usize> {
    r.seek(SeekFrom::Start(offset))?;
    read_full(r, buf)
}

/// Fill `buf`, failing with [`Error::ShortRead`] unless `lenient` is set.
pub(crate) fn fill<R: Read + ?Sized>(r: &mut R, buf: &mut [u8], lenient: bool) -> Result<usize> {
    let n = read_full(r, buf)?;
    if n < buf.len() && !lenient {
        return Err(Error::ShortRead {
            available: n,
            requested: buf.len(),
        });
    }
    Ok(n)
}

/// Apply a signed delta to an unsigned stream position.
///
/// Mirrors the error the standard library reports for seeks before byte 0.
pub(crate) fn offset_position(base: u64, delta: i64) -> io::Result<u64> {
    base.checked_add_signed(delta).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
    })
}
