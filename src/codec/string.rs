//! Null-terminated string decoding.
//!
//! Strings in binary formats are usually stored as a run of code units ended
//! by a zero unit, sometimes inside a fixed-width field. The decoders here
//! stop at the first terminator, at `max_len` bytes, or at the end of the
//! span, whichever comes first.
//!
//! ```text
//! | h | i | 0 | x | x |        max_len = 5
//!  <-len->
//!  <--read-->
//! ```
//!
//! Invalid sequences decode lossily to U+FFFD. UTF-16 units follow the
//! caller's byte order unless the span opens with a byte-order mark, which
//! is honoured and dropped from the text.
//!
//! Stream-bound variants live on [`Codec`](super::Codec).

/// A decoded null-terminated string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullString {
    pub text: String,
    /// Bytes consumed, including the terminator when one was found.
    pub read: usize,
    /// Bytes of string data, excluding the terminator.
    pub len: usize,
}

/// Decode a UTF-8 string from the start of `span`.
pub fn utf8_from(span: &[u8], max_len: usize) -> NullString {
    let lim = span.len().min(max_len);
    let (len, read) = match span[..lim].iter().position(|&b| b == 0) {
        Some(end) => (end, end + 1),
        None => (lim, lim),
    };
    NullString {
        text: decode_utf8(&span[..len]),
        read,
        len,
    }
}

/// Decode a UTF-16 string from the start of `span`.
///
/// `max_len` is in bytes and rounded down to whole units.
pub fn utf16_from(span: &[u8], max_len: usize, le: bool) -> NullString {
    let lim = span.len().min(max_len) & !1;
    let (len, read) = match span[..lim].chunks_exact(2).position(|u| u == [0, 0]) {
        Some(unit) => (unit * 2, unit * 2 + 2),
        None => (lim, lim),
    };
    NullString {
        text: decode_utf16(&span[..len], le),
        read,
        len,
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode packed UTF-16 units, dropping a leading byte-order mark.
pub(crate) fn decode_utf16(bytes: &[u8], le: bool) -> String {
    let (bytes, le) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => (bytes, le),
    };
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|u| {
            let pair = [u[0], u[1]];
            if le { u16::from_le_bytes(pair) } else { u16::from_be_bytes(pair) }
        })
        .collect();
    String::from_utf16_lossy(&units)
}
