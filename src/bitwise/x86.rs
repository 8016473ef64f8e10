//! SSE2 and AVX2 kernels.
//!
//! Callers must have verified the feature at runtime
//! ([`super::Backend::is_supported`]).

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{Op, alignment_start, scalar};

/// Split `buf` into a scalar head, an aligned body of whole `width`-byte
/// vectors and a scalar tail.
#[inline(always)]
fn split(buf: &mut [u8], width: usize) -> (&mut [u8], &mut [u8], &mut [u8]) {
    let head_len = alignment_start(buf, width);
    let (head, rest) = buf.split_at_mut(head_len);
    let body_len = rest.len() / width * width;
    let (body, tail) = rest.split_at_mut(body_len);
    (head, body, tail)
}

/// Aligned load, combine with a splatted vector, aligned store.
macro_rules! fill_body {
    ($body:expr, $vec:ty, $load:ident, $store:ident, $combine:ident, $splat:expr) => {
        for lane in $body.chunks_exact_mut(size_of::<$vec>()) {
            let p = lane.as_mut_ptr().cast::<$vec>();
            $store(p, $combine($load(p.cast_const()), $splat));
        }
    };
}

/// Aligned load of the buffer, unaligned load of the keystream.
macro_rules! pair_body {
    ($body:expr, $keys:expr, $vec:ty, $load:ident, $loadu:ident, $store:ident, $combine:ident) => {
        for (lane, key) in $body
            .chunks_exact_mut(size_of::<$vec>())
            .zip($keys.chunks_exact(size_of::<$vec>()))
        {
            let p = lane.as_mut_ptr().cast::<$vec>();
            let k = $loadu(key.as_ptr().cast::<$vec>());
            $store(p, $combine($load(p.cast_const()), k));
        }
    };
}

#[target_feature(enable = "sse2")]
pub(super) unsafe fn fill_sse2(op: Op, buf: &mut [u8], value: u8) {
    let (head, body, tail) = split(buf, 16);
    scalar::fill(op, head, value);
    // SAFETY: `body` starts 16-byte aligned and holds whole vectors.
    unsafe {
        let v = _mm_set1_epi8(value as i8);
        match op {
            Op::And => fill_body!(body, __m128i, _mm_load_si128, _mm_store_si128, _mm_and_si128, v),
            Op::Or => fill_body!(body, __m128i, _mm_load_si128, _mm_store_si128, _mm_or_si128, v),
            Op::Xor => fill_body!(body, __m128i, _mm_load_si128, _mm_store_si128, _mm_xor_si128, v),
        }
    }
    scalar::fill(op, tail, value);
}

#[target_feature(enable = "sse2")]
pub(super) unsafe fn pair_sse2(op: Op, buf: &mut [u8], operand: &[u8]) {
    let (head, body, tail) = split(buf, 16);
    let (key_head, rest) = operand.split_at(head.len());
    let (key_body, key_tail) = rest.split_at(body.len());
    scalar::pair(op, head, key_head);
    // SAFETY: `body` starts 16-byte aligned; keystream loads are unaligned.
    unsafe {
        match op {
            Op::And => pair_body!(body, key_body, __m128i, _mm_load_si128, _mm_loadu_si128, _mm_store_si128, _mm_and_si128),
            Op::Or => pair_body!(body, key_body, __m128i, _mm_load_si128, _mm_loadu_si128, _mm_store_si128, _mm_or_si128),
            Op::Xor => pair_body!(body, key_body, __m128i, _mm_load_si128, _mm_loadu_si128, _mm_store_si128, _mm_xor_si128),
        }
    }
    scalar::pair(op, tail, key_tail);
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn fill_avx2(op: Op, buf: &mut [u8], value: u8) {
    let (head, body, tail) = split(buf, 32);
    scalar::fill(op, head, value);
    // SAFETY: `body` starts 32-byte aligned and holds whole vectors.
    unsafe {
        let v = _mm256_set1_epi8(value as i8);
        match op {
            Op::And => fill_body!(body, __m256i, _mm256_load_si256, _mm256_store_si256, _mm256_and_si256, v),
            Op::Or => fill_body!(body, __m256i, _mm256_load_si256, _mm256_store_si256, _mm256_or_si256, v),
            Op::Xor => fill_body!(body, __m256i, _mm256_load_si256, _mm256_store_si256, _mm256_xor_si256, v),
        }
    }
    scalar::fill(op, tail, value);
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn pair_avx2(op: Op, buf: &mut [u8], operand: &[u8]) {
    let (head, body, tail) = split(buf, 32);
    let (key_head, rest) = operand.split_at(head.len());
    let (key_body, key_tail) = rest.split_at(body.len());
    scalar::pair(op, head, key_head);
    // SAFETY: `body` starts 32-byte aligned; keystream loads are unaligned.
    unsafe {
        match op {
            Op::And => pair_body!(body, key_body, __m256i, _mm256_load_si256, _mm256_loadu_si256, _mm256_store_si256, _mm256_and_si256),
            Op::Or => pair_body!(body, key_body, __m256i, _mm256_load_si256, _mm256_loadu_si256, _mm256_store_si256, _mm256_or_si256),
            Op::Xor => pair_body!(body, key_body, __m256i, _mm256_load_si256, _mm256_loadu_si256, _mm256_store_si256, _mm256_xor_si256),
        }
    }
    scalar::pair(op, tail, key_tail);
}
