//! IEEE-754 binary16 conversion via precomputed tables.
//!
//! Branch-free in both directions (van der Zijp, "Fast Half Float
//! Conversions"). The five tables are evaluated at compile time:
//!
//! | Table | Entries | Direction |
//! |-------|---------|-----------|
//! | `MANTISSA` | 2048 | half → single |
//! | `EXPONENT` | 64   | half → single |
//! | `OFFSET`   | 64   | half → single |
//! | `BASE`     | 512  | single → half |
//! | `SHIFT`    | 512  | single → half |
//!
//! ```text
//! single = MANTISSA[OFFSET[h >> 10] + (h & 0x3ff)] + EXPONENT[h >> 10]
//! half   = BASE[s >> 23] + ((s & 0x7fffff) >> SHIFT[s >> 23])
//! ```
//!
//! Narrowing truncates the mantissa. Subnormals, signed zeros and infinities
//! convert exactly. A NaN keeps the top ten mantissa bits, so it stays a NaN
//! as long as any of them is set (every quiet NaN qualifies).

/// Normalise the subnormal half mantissa `i` into single-precision bits.
const fn subnormal_mantissa(i: u32) -> u32 {
    let mut m = i << 13;
    let mut e: u32 = 0;
    while m & 0x0080_0000 == 0 {
        e = e.wrapping_sub(0x0080_0000);
        m <<= 1;
    }
    m &= !0x0080_0000;
    e = e.wrapping_add(0x3880_0000);
    m | e
}

const fn mantissa_table() -> [u32; 2048] {
    let mut t = [0u32; 2048];
    let mut i = 1;
    while i < 1024 {
        t[i] = subnormal_mantissa(i as u32);
        i += 1;
    }
    while i < 2048 {
        t[i] = 0x3800_0000 + (((i - 1024) as u32) << 13);
        i += 1;
    }
    t
}

const fn exponent_table() -> [u32; 64] {
    let mut t = [0u32; 64];
    let mut i = 1;
    while i < 31 {
        t[i] = (i as u32) << 23;
        i += 1;
    }
    t[31] = 0x4780_0000;
    t[32] = 0x8000_0000;
    i = 33;
    while i < 63 {
        t[i] = 0x8000_0000 + (((i - 32) as u32) << 23);
        i += 1;
    }
    t[63] = 0xC780_0000;
    t
}

const fn offset_table() -> [u16; 64] {
    let mut t = [1024u16; 64];
    t[0] = 0;
    t[32] = 0;
    t
}

/// `BASE` and `SHIFT` together, indexed by the single's sign and exponent.
const fn narrow_tables() -> ([u16; 512], [u8; 512]) {
    let mut base = [0u16; 512];
    let mut shift = [0u8; 512];
    let mut i = 0;
    while i < 256 {
        let e = i as i32 - 127;
        let (b, s) = if e < -24 {
            // Underflows to signed zero.
            (0x0000, 24)
        } else if e < -14 {
            // Subnormal half.
            ((0x0400 >> (-e - 14)) as u16, (-e - 1) as u8)
        } else if e <= 15 {
            (((e + 15) << 10) as u16, 13)
        } else if e < 128 {
            // Overflows to infinity.
            (0x7C00, 24)
        } else {
            // Infinity and NaN keep their class.
            (0x7C00, 13)
        };
        base[i] = b;
        base[i | 0x100] = b | 0x8000;
        shift[i] = s;
        shift[i | 0x100] = s;
        i += 1;
    }
    (base, shift)
}

static MANTISSA: [u32; 2048] = mantissa_table();
static EXPONENT: [u32; 64] = exponent_table();
static OFFSET: [u16; 64] = offset_table();
static NARROW: ([u16; 512], [u8; 512]) = narrow_tables();

/// Widen half-precision bits to an `f32`.
#[inline]
pub fn f16_to_f32(half: u16) -> f32 {
    let hi = (half >> 10) as usize;
    let bits = MANTISSA[OFFSET[hi] as usize + (half & 0x3FF) as usize] + EXPONENT[hi];
    f32::from_bits(bits)
}

/// Narrow an `f32` to half-precision bits, truncating the mantissa.
#[inline]
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let idx = ((bits >> 23) & 0x1FF) as usize;
    let (base, shift) = (&NARROW.0, &NARROW.1);
    base[idx] + ((bits & 0x007F_FFFF) >> shift[idx]) as u16
}

/// Widen `halves` into `out`. Returns the number of values converted
/// (the shorter of the two lengths).
pub fn halves_to_f32(halves: &[u16], out: &mut [f32]) -> usize {
    let n = halves.len().min(out.len());
    for (dst, &h) in out.iter_mut().zip(&halves[..n]) {
        *dst = f16_to_f32(h);
    }
    n
}

/// Narrow `values` into `out`. Returns the number of values converted.
pub fn f32_to_halves(values: &[f32], out: &mut [u16]) -> usize {
    let n = values.len().min(out.len());
    for (dst, &v) in out.iter_mut().zip(&values[..n]) {
        *dst = f32_to_f16(v);
    }
    n
}
