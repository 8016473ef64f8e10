//! Portable 64-bit SWAR kernels.
//!
//! The buffer is split into an unaligned byte head, a body of aligned `u64`
//! words and a byte tail. Keystream words are loaded unaligned.

use super::{Op, scalar};

pub(super) fn fill(op: Op, buf: &mut [u8], value: u8) {
    let (head, body, tail) = bytemuck::pod_align_to_mut::<u8, u64>(buf);
    scalar::fill(op, head, value);
    let v = u64::from_ne_bytes([value; 8]);
    match op {
        Op::And => body.iter_mut().for_each(|w| *w &= v),
        Op::Or => body.iter_mut().for_each(|w| *w |= v),
        Op::Xor => body.iter_mut().for_each(|w| *w ^= v),
    }
    scalar::fill(op, tail, value);
}

pub(super) fn pair(op: Op, buf: &mut [u8], operand: &[u8]) {
    let (head, body, tail) = bytemuck::pod_align_to_mut::<u8, u64>(buf);
    let (key_head, rest) = operand.split_at(head.len());
    let (key_body, key_tail) = rest.split_at(body.len() * 8);

    scalar::pair(op, head, key_head);
    let words = body
        .iter_mut()
        .zip(key_body.chunks_exact(8).map(bytemuck::pod_read_unaligned::<u64>));
    match op {
        Op::And => words.for_each(|(w, k)| *w &= k),
        Op::Or => words.for_each(|(w, k)| *w |= k),
        Op::Xor => words.for_each(|(w, k)| *w ^= k),
    }
    scalar::pair(op, tail, key_tail);
}
