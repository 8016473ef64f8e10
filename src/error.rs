//! Library-wide error and result types.

use std::io;

/// Result alias used throughout rekit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Precondition violations on in-memory containers (an out-of-range index
/// into a [`crate::recency::RecencyList`]) are panics, not variants here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A construction parameter or call argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The operation is not supported by this adapter (e.g. writing to a
    /// read-only [`crate::cache::ChunkCache`]).
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A strict read hit the end of the source before filling its target.
    #[error(
        "source does not have enough data to fill the requested number of bytes; \
         {available} bytes available, {requested} bytes requested"
    )]
    ShortRead {
        /// Bytes that were actually read.
        available: usize,
        /// Bytes the caller asked for.
        requested: usize,
    },
    /// An offset or size would access outside the valid region of a span.
    #[error("invalid offset or size")]
    InvalidRange,
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::InvalidArgument(_) | Error::InvalidRange => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            Error::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, e),
            Error::ShortRead { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_read_reports_both_counts() {
        let e = Error::ShortRead {
            available: 3,
            requested: 8,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 bytes available"));
        assert!(msg.contains("8 bytes requested"));
    }

    #[test]
    fn converts_into_io_error_kinds() {
        let io: io::Error = Error::Unsupported("write").into();
        assert_eq!(io.kind(), io::ErrorKind::Unsupported);

        let io: io::Error = Error::ShortRead {
            available: 0,
            requested: 1,
        }
        .into();
        assert_eq!(io.kind(), io::ErrorKind::UnexpectedEof);

        let inner = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let io: io::Error = Error::Io(inner).into();
        assert_eq!(io.kind(), io::ErrorKind::BrokenPipe);
    }
}
