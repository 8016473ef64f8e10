//! Endian-aware primitive codec.
//!
//! Converts between byte spans and fixed-width numbers. Every accessor
//! copies exactly `size_of::<T>()` bytes out of (or into) a span that may be
//! longer than needed and may start at any address; no alignment is asked of
//! the caller.
//!
//! ## Endianness
//! Each call takes `le: bool` (`true` = little-endian). A byte swap happens
//! only when the requested order differs from the host's [`NATIVE_LE`], so a
//! native-order request is a plain unaligned load or store.
//!
//! ## Supported types
//! | Width | Types | Named entry points |
//! |-------|-------|--------------------|
//! | 8  | `u8` `i8` | [`get_u8`] [`get_i8`] |
//! | 16 | `u16` `i16` + half | [`get_u16`] [`get_i16`] [`get_f16`] |
//! | 32 | `u32` `i32` `f32` | [`get_u32`] [`get_i32`] [`get_f32`] |
//! | 64 | `u64` `i64` `f64` | [`get_u64`] [`get_i64`] [`get_f64`] |
//!
//! Each `get_*` has a matching `set_*`. The generic [`get`] / [`set`] back
//! all of them.
//!
//! ## Bulk conversion
//! [`convert_array`] swaps every element of a typed slice in place;
//! [`convert_bytes`] does the same for a byte slice holding packed elements.
//! Both return immediately when the orders already agree.
//!
//! Stream-bound reads live in [`read`], null-terminated string decoding in
//! [`string`], half-precision tables in [`half`].

pub mod half;
pub mod read;
pub mod string;

pub use half::{f16_to_f32, f32_to_f16, f32_to_halves, halves_to_f32};
pub use read::Codec;
pub use string::{NullString, utf16_from, utf8_from};

use crate::{Error, Result};

/// Whether the host stores numbers little-endian.
pub const NATIVE_LE: bool = cfg!(target_endian = "little");

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width number the codec can load and store.
///
/// Implemented for `u8 i8 u16 i16 u32 i32 u64 i64 f32 f64`. Sealed.
pub trait Primitive: bytemuck::Pod + sealed::Sealed {
    /// Encoded width in bytes.
    const SIZE: usize = size_of::<Self>();

    /// Reverse the byte order of the value's representation.
    fn swap_order(self) -> Self;

    /// Convert between host order and the order selected by `le`.
    #[inline]
    fn to_order(self, le: bool) -> Self {
        if le == NATIVE_LE { self } else { self.swap_order() }
    }
}

macro_rules! int_primitive {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}
        impl Primitive for $t {
            #[inline]
            fn swap_order(self) -> Self {
                self.swap_bytes()
            }
        }
    )*};
}

macro_rules! float_primitive {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}
        impl Primitive for $t {
            #[inline]
            fn swap_order(self) -> Self {
                <$t>::from_bits(self.to_bits().swap_bytes())
            }
        }
    )*};
}

int_primitive!(u8, i8, u16, i16, u32, i32, u64, i64);
float_primitive!(f32, f64);

/// Bytes `offset..offset + len` of `span`, or [`Error::InvalidRange`].
#[inline]
fn window(span: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset.checked_add(len).ok_or(Error::InvalidRange)?;
    span.get(offset..end).ok_or(Error::InvalidRange)
}

#[inline]
fn window_mut(span: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8]> {
    let end = offset.checked_add(len).ok_or(Error::InvalidRange)?;
    span.get_mut(offset..end).ok_or(Error::InvalidRange)
}

/// Load a `T` stored at `offset` in the given byte order.
#[inline]
pub fn get<T: Primitive>(span: &[u8], le: bool, offset: usize) -> Result<T> {
    let bytes = window(span, offset, T::SIZE)?;
    Ok(bytemuck::pod_read_unaligned::<T>(bytes).to_order(le))
}

/// Store `value` at `offset` in the given byte order.
#[inline]
pub fn set<T: Primitive>(span: &mut [u8], le: bool, offset: usize, value: T) -> Result<()> {
    let bytes = window_mut(span, offset, T::SIZE)?;
    bytes.copy_from_slice(bytemuck::bytes_of(&value.to_order(le)));
    Ok(())
}

macro_rules! named_accessors {
    ($($t:ty => $get:ident, $set:ident;)*) => {$(
        #[doc = concat!("Load a `", stringify!($t), "` at `offset`.")]
        #[inline]
        pub fn $get(span: &[u8], le: bool, offset: usize) -> Result<$t> {
            get(span, le, offset)
        }

        #[doc = concat!("Store a `", stringify!($t), "` at `offset`.")]
        #[inline]
        pub fn $set(span: &mut [u8], le: bool, offset: usize, value: $t) -> Result<()> {
            set(span, le, offset, value)
        }
    )*};
}

named_accessors! {
    u8 => get_u8, set_u8;
    i8 => get_i8, set_i8;
    u16 => get_u16, set_u16;
    i16 => get_i16, set_i16;
    u32 => get_u32, set_u32;
    i32 => get_i32, set_i32;
    u64 => get_u64, set_u64;
    i64 => get_i64, set_i64;
    f32 => get_f32, set_f32;
    f64 => get_f64, set_f64;
}

/// Load an IEEE-754 half stored at `offset`, widened to `f32`.
#[inline]
pub fn get_f16(span: &[u8], le: bool, offset: usize) -> Result<f32> {
    get::<u16>(span, le, offset).map(f16_to_f32)
}

/// Narrow `value` to an IEEE-754 half and store it at `offset`.
#[inline]
pub fn set_f16(span: &mut [u8], le: bool, offset: usize, value: f32) -> Result<()> {
    set(span, le, offset, f32_to_f16(value))
}

/// Swap every element of `values` between host order and `le` order.
///
/// A no-op when `le` already matches the host.
pub fn convert_array<T: Primitive>(values: &mut [T], le: bool) {
    if le == NATIVE_LE || T::SIZE == 1 {
        return;
    }
    for v in values.iter_mut() {
        *v = v.swap_order();
    }
}

/// Swap every packed `T` in `bytes` between host order and `le` order.
///
/// Trailing bytes that do not form a whole element are left untouched.
/// Returns the number of whole elements covered.
pub fn convert_bytes<T: Primitive>(bytes: &mut [u8], le: bool) -> usize {
    let count = bytes.len() / T::SIZE;
    if le == NATIVE_LE || T::SIZE == 1 {
        return count;
    }
    for element in bytes.chunks_exact_mut(T::SIZE) {
        element.reverse();
    }
    count
}

macro_rules! named_converters {
    ($($t:ty => $array:ident, $bytes:ident;)*) => {$(
        #[doc = concat!("In-place order conversion of a `", stringify!($t), "` slice.")]
        #[inline]
        pub fn $array(values: &mut [$t], le: bool) {
            convert_array(values, le)
        }

        #[doc = concat!("In-place order conversion of packed `", stringify!($t), "` bytes.")]
        #[inline]
        pub fn $bytes(bytes: &mut [u8], le: bool) -> usize {
            convert_bytes::<$t>(bytes, le)
        }
    )*};
}

named_converters! {
    u16 => convert_u16_array, convert_u16_bytes;
    i16 => convert_i16_array, convert_i16_bytes;
    u32 => convert_u32_array, convert_u32_bytes;
    i32 => convert_i32_array, convert_i32_bytes;
    u64 => convert_u64_array, convert_u64_bytes;
    i64 => convert_i64_array, convert_i64_bytes;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_orders_at_misaligned_offset() {
        let buf = [0xFF, 0x12, 0x34, 0x56, 0x78, 0xFF];
        assert_eq!(get_u32(&buf, true, 1).unwrap(), 0x7856_3412);
        assert_eq!(get_u32(&buf, false, 1).unwrap(), 0x1234_5678);
        assert_eq!(get_u16(&buf, false, 3).unwrap(), 0x5678);
        assert_eq!(get_i8(&buf, true, 0).unwrap(), -1);
    }

    #[test]
    fn signed_values_sign_extend() {
        let buf = [0xFE, 0xFF, 0xFF, 0xFF];
        assert_eq!(get_i16(&buf, true, 0).unwrap(), -2);
        assert_eq!(get_i32(&buf, true, 0).unwrap(), -2);
        assert_eq!(get_i16(&buf, false, 0).unwrap(), -257);
    }

    #[test]
    fn set_writes_only_its_width() {
        let mut buf = [0xAAu8; 12];
        set_u64(&mut buf, false, 2, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(buf, [0xAA, 0xAA, 1, 2, 3, 4, 5, 6, 7, 8, 0xAA, 0xAA]);
        set_i16(&mut buf, true, 0, -2).unwrap();
        assert_eq!(&buf[..3], &[0xFE, 0xFF, 1]);
    }

    #[test]
    fn floats_round_trip_through_bits() {
        let mut buf = [0u8; 8];
        set_f64(&mut buf, false, 0, 1.5).unwrap();
        assert_eq!(buf, [0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
        assert_eq!(get_f64(&buf, false, 0).unwrap(), 1.5);

        set_f32(&mut buf, true, 4, -2.0).unwrap();
        assert_eq!(&buf[4..], &[0, 0, 0, 0xC0]);
        assert_eq!(get_f32(&buf, true, 4).unwrap(), -2.0);
    }

    #[test]
    fn half_accessors() {
        let buf = [0x3C, 0x00];
        assert_eq!(get_f16(&buf, false, 0).unwrap(), 1.0);
        let mut out = [0u8; 2];
        set_f16(&mut out, true, 0, -2.0).unwrap();
        assert_eq!(out, [0x00, 0xC0]);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let buf = [0u8; 4];
        assert!(matches!(get_u32(&buf, true, 1), Err(Error::InvalidRange)));
        assert!(matches!(get_u8(&buf, true, 4), Err(Error::InvalidRange)));
        assert!(matches!(get_u16(&buf, true, usize::MAX), Err(Error::InvalidRange)));
        let mut buf = [0u8; 2];
        assert!(matches!(set_u32(&mut buf, true, 0, 1), Err(Error::InvalidRange)));
    }

    #[test]
    fn convert_array_swaps_only_when_foreign() {
        let mut values = [0x0102u16, 0x0304];
        convert_array(&mut values, NATIVE_LE);
        assert_eq!(values, [0x0102, 0x0304]);
        convert_u16_array(&mut values, !NATIVE_LE);
        assert_eq!(values, [0x0201, 0x0403]);
    }

    #[test]
    fn convert_bytes_leaves_partial_tail() {
        let mut bytes = [1u8, 2, 3, 4, 5, 6, 7];
        let n = convert_u32_bytes(&mut bytes, !NATIVE_LE);
        assert_eq!(n, 1);
        assert_eq!(bytes, [4, 3, 2, 1, 5, 6, 7]);

        let mut bytes = [1u8, 2, 3, 4];
        assert_eq!(convert_i16_bytes(&mut bytes, NATIVE_LE), 2);
        assert_eq!(bytes, [1, 2, 3, 4]);
    }

    #[test]
    fn swap_twice_is_identity() {
        assert_eq!(0x1234_5678_9abc_def0u64.swap_order().swap_order(), 0x1234_5678_9abc_def0);
        let f = -123.456f64;
        assert_eq!(f.swap_order().swap_order().to_bits(), f.to_bits());
    }
}
