//! AArch64 NEON kernels.

use std::arch::aarch64::*;

use super::{Op, alignment_start, scalar};

const WIDTH: usize = 16;

fn split(buf: &mut [u8]) -> (&mut [u8], &mut [u8], &mut [u8]) {
    let head_len = alignment_start(buf, WIDTH);
    let (head, rest) = buf.split_at_mut(head_len);
    let body_len = rest.len() / WIDTH * WIDTH;
    let (body, tail) = rest.split_at_mut(body_len);
    (head, body, tail)
}

macro_rules! fill_body {
    ($body:expr, $combine:ident, $splat:expr) => {
        for lane in $body.chunks_exact_mut(WIDTH) {
            let p = lane.as_mut_ptr();
            vst1q_u8(p, $combine(vld1q_u8(p), $splat));
        }
    };
}

macro_rules! pair_body {
    ($body:expr, $keys:expr, $combine:ident) => {
        for (lane, key) in $body.chunks_exact_mut(WIDTH).zip($keys.chunks_exact(WIDTH)) {
            let p = lane.as_mut_ptr();
            vst1q_u8(p, $combine(vld1q_u8(p), vld1q_u8(key.as_ptr())));
        }
    };
}

#[target_feature(enable = "neon")]
pub(super) unsafe fn fill(op: Op, buf: &mut [u8], value: u8) {
    let (head, body, tail) = split(buf);
    scalar::fill(op, head, value);
    // SAFETY: every lane is a whole 16-byte slice of `body`.
    unsafe {
        let v = vdupq_n_u8(value);
        match op {
            Op::And => fill_body!(body, vandq_u8, v),
            Op::Or => fill_body!(body, vorrq_u8, v),
            Op::Xor => fill_body!(body, veorq_u8, v),
        }
    }
    scalar::fill(op, tail, value);
}

#[target_feature(enable = "neon")]
pub(super) unsafe fn pair(op: Op, buf: &mut [u8], operand: &[u8]) {
    let (head, body, tail) = split(buf);
    let (key_head, rest) = operand.split_at(head.len());
    let (key_body, key_tail) = rest.split_at(body.len());
    scalar::pair(op, head, key_head);
    // SAFETY: lanes and keys are whole 16-byte slices.
    unsafe {
        match op {
            Op::And => pair_body!(body, key_body, vandq_u8),
            Op::Or => pair_body!(body, key_body, vorrq_u8),
            Op::Xor => pair_body!(body, key_body, veorq_u8),
        }
    }
    scalar::pair(op, tail, key_tail);
}
