//! Stream-bound reads with a configurable byte order and leniency.
//!
//! A [`Codec`] bundles the two knobs every format reader threads through its
//! field reads: the byte order and whether a short bulk read is acceptable.
//!
//! | Operation | Short source, lenient | Short source, strict |
//! |-----------|-----------------------|----------------------|
//! | [`Codec::read`] / [`Codec::read_at`] | [`Error::ShortRead`] | [`Error::ShortRead`] |
//! | [`Codec::read_bytes`] | returns the count read | [`Error::ShortRead`] |
//! | [`Codec::read_vec`] | truncated `Vec` | [`Error::ShortRead`] |
//! | [`Codec::read_array`] | whole elements read | [`Error::ShortRead`] |
//! | [`Codec::skip`] | bytes skipped | [`Error::ShortRead`] |
//! | [`Codec::read_utf8_field`] / [`Codec::read_utf16_field`] | string, field end clipped | [`Error::ShortRead`] |
//!
//! A single scalar has no meaningful partial value, so scalar reads ignore
//! leniency.
//!
//! ## Strings
//! [`Codec::read_utf8`] and [`Codec::read_utf16`] consume one unit at a time
//! until a zero unit, `max_len` bytes, or the end of the source. UTF-16 units
//! use the codec's byte order. The `_field` variants then skip to the end of
//! a fixed-width field; the `_at` variants read at an offset and put the
//! cursor back where it was.

use std::io::{self, Read, Seek, SeekFrom};

use super::string::{NullString, decode_utf8, decode_utf16};
use super::{Primitive, NATIVE_LE, convert_array, f16_to_f32};
use crate::utils::{fill, read_full};
use crate::{Error, Result};

/// Byte order plus short-read policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Codec {
    /// Little-endian when `true`.
    pub le: bool,
    /// Allow bulk reads to come up short without an error.
    pub lenient: bool,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            le: NATIVE_LE,
            lenient: true,
        }
    }
}

impl Codec {
    pub const fn new(le: bool, lenient: bool) -> Self {
        Self { le, lenient }
    }

    /// Little-endian, lenient.
    pub const fn little() -> Self {
        Self::new(true, true)
    }

    /// Big-endian, lenient.
    pub const fn big() -> Self {
        Self::new(false, true)
    }

    pub const fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Read one `T` from the current position.
    pub fn read<T: Primitive, R: Read + ?Sized>(&self, r: &mut R) -> Result<T> {
        let mut value = T::zeroed();
        fill(r, bytemuck::bytes_of_mut(&mut value), false)?;
        Ok(value.to_order(self.le))
    }

    /// Seek to `offset`, then [`read`](Self::read).
    pub fn read_at<T: Primitive, R: Read + Seek + ?Sized>(&self, r: &mut R, offset: u64) -> Result<T> {
        r.seek(SeekFrom::Start(offset))?;
        self.read(r)
    }

    /// Read a half-precision value, widened to `f32`.
    pub fn read_f16<R: Read + ?Sized>(&self, r: &mut R) -> Result<f32> {
        self.read::<u16, R>(r).map(f16_to_f32)
    }

    /// Fill `buf` from the current position.
    ///
    /// Returns the number of bytes read, which is below `buf.len()` only in
    /// lenient mode.
    pub fn read_bytes<R: Read + ?Sized>(&self, r: &mut R, buf: &mut [u8]) -> Result<usize> {
        fill(r, buf, self.lenient)
    }

    /// Seek to `offset`, then [`read_bytes`](Self::read_bytes).
    pub fn read_bytes_at<R: Read + Seek + ?Sized>(
        &self,
        r: &mut R,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize> {
        r.seek(SeekFrom::Start(offset))?;
        self.read_bytes(r, buf)
    }

    /// Read up to `len` bytes into a new `Vec`.
    pub fn read_vec<R: Read + ?Sized>(&self, r: &mut R, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.read_bytes(r, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Fill `out` with packed elements and convert them to host order.
    ///
    /// Returns the number of whole elements read. In lenient mode a trailing
    /// partial element is consumed from the source but not counted, and
    /// `out[count..]` keeps unspecified contents.
    pub fn read_array<T: Primitive, R: Read + ?Sized>(&self, r: &mut R, out: &mut [T]) -> Result<usize> {
        let n = fill(r, bytemuck::cast_slice_mut(out), self.lenient)?;
        let count = n / T::SIZE;
        convert_array(&mut out[..count], self.le);
        Ok(count)
    }

    /// Advance past `len` bytes by reading and discarding them.
    pub fn skip<R: Read + ?Sized>(&self, r: &mut R, len: u64) -> Result<u64> {
        let skipped = io::copy(&mut (&mut *r).take(len), &mut io::sink())?;
        if skipped < len && !self.lenient {
            return Err(Error::ShortRead {
                available: usize::try_from(skipped).unwrap_or(usize::MAX),
                requested: usize::try_from(len).unwrap_or(usize::MAX),
            });
        }
        Ok(skipped)
    }

    /// Read a null-terminated UTF-8 string of at most `max_len` bytes.
    pub fn read_utf8<R: Read + ?Sized>(&self, r: &mut R, max_len: usize) -> Result<NullString> {
        let mut bytes = Vec::new();
        let mut read = 0;
        let mut byte = [0u8; 1];
        while read < max_len {
            if read_full(r, &mut byte)? == 0 {
                break;
            }
            read += 1;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
        }
        Ok(NullString {
            text: decode_utf8(&bytes),
            read,
            len: bytes.len(),
        })
    }

    /// Read a null-terminated UTF-16 string of at most `max_len` bytes.
    ///
    /// A trailing odd byte of the source is consumed and counted in
    /// [`NullString::read`] but not decoded.
    pub fn read_utf16<R: Read + ?Sized>(&self, r: &mut R, max_len: usize) -> Result<NullString> {
        let mut bytes = Vec::new();
        let mut read = 0;
        let mut unit = [0u8; 2];
        while read + 2 <= max_len {
            let n = read_full(r, &mut unit)?;
            read += n;
            if n < 2 || unit == [0, 0] {
                break;
            }
            bytes.extend_from_slice(&unit);
        }
        Ok(NullString {
            text: decode_utf16(&bytes, self.le),
            read,
            len: bytes.len(),
        })
    }

    /// [`read_utf8`](Self::read_utf8) within a `field_len`-byte field, then
    /// skip whatever remains of the field.
    pub fn read_utf8_field<R: Read + ?Sized>(&self, r: &mut R, field_len: usize) -> Result<NullString> {
        let s = self.read_utf8(r, field_len)?;
        self.skip(r, (field_len - s.read) as u64)?;
        Ok(s)
    }

    /// [`read_utf16`](Self::read_utf16) within a `field_len`-byte field,
    /// then skip whatever remains of the field.
    pub fn read_utf16_field<R: Read + ?Sized>(&self, r: &mut R, field_len: usize) -> Result<NullString> {
        let s = self.read_utf16(r, field_len)?;
        self.skip(r, (field_len - s.read) as u64)?;
        Ok(s)
    }

    /// [`read_utf8`](Self::read_utf8) at `offset`. The cursor is restored
    /// afterwards, also on failure.
    pub fn read_utf8_at<R: Read + Seek + ?Sized>(
        &self,
        r: &mut R,
        offset: u64,
        max_len: usize,
    ) -> Result<NullString> {
        restoring(r, offset, |r| self.read_utf8(r, max_len))
    }

    /// [`read_utf16`](Self::read_utf16) at `offset`. The cursor is restored
    /// afterwards, also on failure.
    pub fn read_utf16_at<R: Read + Seek + ?Sized>(
        &self,
        r: &mut R,
        offset: u64,
        max_len: usize,
    ) -> Result<NullString> {
        restoring(r, offset, |r| self.read_utf16(r, max_len))
    }
}

/// Run `f` with the cursor at `offset`, then seek back.
fn restoring<R, T>(r: &mut R, offset: u64, f: impl FnOnce(&mut R) -> Result<T>) -> Result<T>
where
    R: Read + Seek + ?Sized,
{
    let home = r.stream_position()?;
    r.seek(SeekFrom::Start(offset))?;
    let result = f(r);
    r.seek(SeekFrom::Start(home))?;
    result
}
