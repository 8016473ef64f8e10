//! Elementwise AND / OR / XOR over byte buffers.
//!
//! Two operand shapes:
//!
//! - a single byte applied to every element ([`BitwiseTransform::apply`]);
//! - a second buffer used as a keystream ([`BitwiseTransform::apply_with`]),
//!   shaped by a [`SequenceBehaviour`]:
//!
//! | Behaviour | Effect |
//! |-----------|--------|
//! | [`Repeat`](SequenceBehaviour::Repeat)     | operand index wraps modulo its length; an empty operand leaves the buffer untouched |
//! | [`Truncate`](SequenceBehaviour::Truncate) | only the first `min(buf.len(), operand.len())` bytes change |
//!
//! ## Backends
//! | Backend | Width | Availability |
//! |---------|-------|--------------|
//! | [`Scalar`](Backend::Scalar) | 1  | everywhere (reference) |
//! | [`Word`](Backend::Word)     | 8  | everywhere (64-bit SWAR) |
//! | [`Sse2`](Backend::Sse2)     | 16 | x86 / x86_64 |
//! | [`Avx2`](Backend::Avx2)     | 32 | x86 / x86_64 with AVX2 |
//! | [`Neon`](Backend::Neon)     | 16 | aarch64 |
//!
//! Every backend processes a scalar head up to the first address aligned to
//! its width, an aligned vector body, then a scalar tail. All backends
//! produce byte-identical output for every input.
//!
//! [`Backend::detect`] picks the widest backend the CPU supports, once per
//! process. The free functions ([`apply_xor`], [`apply_xor_with`], ...) use
//! it.

mod scalar;
mod word;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;

#[cfg(target_arch = "aarch64")]
mod neon;

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

/// Shortest keystream handed to a backend in [`SequenceBehaviour::Repeat`]
/// mode. Shorter operands are tiled up to at least this length first.
const MIN_KEYSTREAM: usize = 256;

/// Bitwise operation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    And,
    Or,
    Xor,
}

/// How a keystream shorter than the buffer is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceBehaviour {
    /// Cycle the operand across the whole buffer.
    #[default]
    Repeat,
    /// Stop at the end of the shorter of the two.
    Truncate,
}

/// Implementation strategy for the transform kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Word,
    Sse2,
    Avx2,
    Neon,
}

impl Backend {
    /// Every backend, narrowest first.
    pub const ALL: [Backend; 5] = [
        Backend::Scalar,
        Backend::Word,
        Backend::Sse2,
        Backend::Neon,
        Backend::Avx2,
    ];

    /// Bytes processed per step in the aligned body.
    pub const fn width(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Word => 8,
            Backend::Sse2 | Backend::Neon => 16,
            Backend::Avx2 => 32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Word => "word",
            Backend::Sse2 => "sse2",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }

    /// Whether this backend can run on the current CPU.
    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar | Backend::Word => true,
            Backend::Sse2 => {
                #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                {
                    is_x86_feature_detected!("sse2")
                }
                #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
                {
                    false
                }
            }
            Backend::Avx2 => {
                #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                {
                    is_x86_feature_detected!("avx2")
                }
                #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
                {
                    false
                }
            }
            Backend::Neon => {
                #[cfg(target_arch = "aarch64")]
                {
                    std::arch::is_aarch64_feature_detected!("neon")
                }
                #[cfg(not(target_arch = "aarch64"))]
                {
                    false
                }
            }
        }
    }

    /// Every backend runnable here, narrowest first.
    pub fn supported() -> Vec<Backend> {
        Self::ALL.into_iter().filter(|b| b.is_supported()).collect()
    }

    /// Widest supported backend. Resolved on first call and cached.
    pub fn detect() -> Backend {
        static DETECTED: OnceLock<Backend> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let backend = Self::ALL
                .into_iter()
                .rev()
                .find(|b| b.is_supported())
                .unwrap_or(Backend::Scalar);
            debug!(backend = backend.name(), "selected bitwise backend");
            backend
        })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A transform bound to one verified backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitwiseTransform {
    backend: Backend,
}

impl Default for BitwiseTransform {
    fn default() -> Self {
        Self::detect()
    }
}

impl BitwiseTransform {
    /// Bind to `backend`, or [`None`] if the CPU cannot run it.
    pub fn new(backend: Backend) -> Option<Self> {
        backend.is_supported().then_some(Self { backend })
    }

    /// Bind to [`Backend::detect`].
    pub fn detect() -> Self {
        Self {
            backend: Backend::detect(),
        }
    }

    /// The reference implementation.
    pub const fn scalar() -> Self {
        Self {
            backend: Backend::Scalar,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Combine every byte of `buf` with `value`.
    pub fn apply(&self, op: Op, buf: &mut [u8], value: u8) {
        match self.backend {
            Backend::Scalar => scalar::fill(op, buf, value),
            Backend::Word => word::fill(op, buf, value),
            // SAFETY: `new` only admits backends the CPU supports.
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => unsafe { x86::fill_sse2(op, buf, value) },
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => unsafe { x86::fill_avx2(op, buf, value) },
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => unsafe { neon::fill(op, buf, value) },
            _ => scalar::fill(op, buf, value),
        }
    }

    /// Combine `buf` elementwise with an equally long `operand`.
    fn pair(&self, op: Op, buf: &mut [u8], operand: &[u8]) {
        debug_assert_eq!(buf.len(), operand.len());
        match self.backend {
            Backend::Scalar => scalar::pair(op, buf, operand),
            Backend::Word => word::pair(op, buf, operand),
            // SAFETY: `new` only admits backends the CPU supports.
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => unsafe { x86::pair_sse2(op, buf, operand) },
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => unsafe { x86::pair_avx2(op, buf, operand) },
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => unsafe { neon::pair(op, buf, operand) },
            _ => scalar::pair(op, buf, operand),
        }
    }

    /// Combine `buf` with `operand` used as a keystream.
    pub fn apply_with(&self, op: Op, buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
        match behaviour {
            SequenceBehaviour::Truncate => {
                let n = buf.len().min(operand.len());
                self.pair(op, &mut buf[..n], &operand[..n]);
            }
            SequenceBehaviour::Repeat => {
                if operand.is_empty() {
                    return;
                }
                if operand.len() >= buf.len() {
                    let n = buf.len();
                    self.pair(op, buf, &operand[..n]);
                    return;
                }
                // Tile short keystreams so each backend call covers whole vectors.
                let mut tiled = [0u8; 2 * MIN_KEYSTREAM];
                let keystream = if operand.len() < MIN_KEYSTREAM {
                    let len = MIN_KEYSTREAM.div_ceil(operand.len()) * operand.len();
                    for period in tiled[..len].chunks_exact_mut(operand.len()) {
                        period.copy_from_slice(operand);
                    }
                    &tiled[..len]
                } else {
                    operand
                };
                for chunk in buf.chunks_mut(keystream.len()) {
                    let n = chunk.len();
                    self.pair(op, chunk, &keystream[..n]);
                }
            }
        }
    }

    pub fn and(&self, buf: &mut [u8], value: u8) {
        self.apply(Op::And, buf, value)
    }

    pub fn or(&self, buf: &mut [u8], value: u8) {
        self.apply(Op::Or, buf, value)
    }

    pub fn xor(&self, buf: &mut [u8], value: u8) {
        self.apply(Op::Xor, buf, value)
    }

    pub fn and_with(&self, buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
        self.apply_with(Op::And, buf, operand, behaviour)
    }

    pub fn or_with(&self, buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
        self.apply_with(Op::Or, buf, operand, behaviour)
    }

    pub fn xor_with(&self, buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
        self.apply_with(Op::Xor, buf, operand, behaviour)
    }
}

/// AND every byte of `buf` with `value` using the detected backend.
pub fn apply_and(buf: &mut [u8], value: u8) {
    BitwiseTransform::detect().and(buf, value)
}

/// OR every byte of `buf` with `value` using the detected backend.
pub fn apply_or(buf: &mut [u8], value: u8) {
    BitwiseTransform::detect().or(buf, value)
}

/// XOR every byte of `buf` with `value` using the detected backend.
pub fn apply_xor(buf: &mut [u8], value: u8) {
    BitwiseTransform::detect().xor(buf, value)
}

pub fn apply_and_with(buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
    BitwiseTransform::detect().and_with(buf, operand, behaviour)
}

pub fn apply_or_with(buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
    BitwiseTransform::detect().or_with(buf, operand, behaviour)
}

pub fn apply_xor_with(buf: &mut [u8], operand: &[u8], behaviour: SequenceBehaviour) {
    BitwiseTransform::detect().xor_with(buf, operand, behaviour)
}

/// Index of the first byte of `buf` whose address is a multiple of
/// `alignment`, or `buf.len()` if there is none.
///
/// An `alignment` of 0 or 1 treats every address as aligned.
pub fn alignment_start(buf: &[u8], alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    let addr = buf.as_ptr().addr();
    ((alignment - addr % alignment) % alignment).min(buf.len())
}

/// Whether `buf` holds at least one full `alignment`-sized block starting on
/// an aligned address.
pub fn contains_at_least_one_aligned(buf: &[u8], alignment: usize) -> bool {
    buf.len() - alignment_start(buf, alignment) >= alignment
}

/// Round `value` up to a multiple of `alignment` (unchanged when 0).
pub const fn align_up(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

/// Round `value` down to a multiple of `alignment` (unchanged when 0).
pub const fn align_down(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        value
    } else {
        value / alignment * alignment
    }
}

/// Replace each element with `f(element, index)`.
pub fn apply_transform<T: Copy>(span: &mut [T], mut f: impl FnMut(T, usize) -> T) {
    for (i, v) in span.iter_mut().enumerate() {
        *v = f(*v, i);
    }
}
