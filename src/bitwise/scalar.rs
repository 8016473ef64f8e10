//! Byte-at-a-time reference kernels. Also used for the unaligned head and
//! tail of every vector backend.

use super::Op;

pub(super) fn fill(op: Op, buf: &mut [u8], value: u8) {
    match op {
        Op::And => buf.iter_mut().for_each(|b| *b &= value),
        Op::Or => buf.iter_mut().for_each(|b| *b |= value),
        Op::Xor => buf.iter_mut().for_each(|b| *b ^= value),
    }
}

/// `operand` must be at least as long as `buf`.
pub(super) fn pair(op: Op, buf: &mut [u8], operand: &[u8]) {
    let pairs = buf.iter_mut().zip(operand);
    match op {
        Op::And => pairs.for_each(|(b, k)| *b &= k),
        Op::Or => pairs.for_each(|(b, k)| *b |= k),
        Op::Xor => pairs.for_each(|(b, k)| *b ^= k),
    }
}
