//! **rekit** - I/O primitives for reverse-engineering binary containers.
//!
//! Format readers for undocumented archives share the same needs: cheap
//! random-offset reads over large files, locating magic markers without
//! loading the file, decoding fixed-width fields in either byte order, and
//! stripping XOR-style obfuscation. This crate provides those pieces; the
//! per-format logic lives in the caller.
//!
//! # Modules
//! | Module | Provides |
//! |--------|----------|
//! | [`cache`]   | [`ChunkCache`] - LRU chunk cache presenting `Read + Seek + BufRead` |
//! | [`recency`] | [`RecencyList`] - fixed-capacity ordered list with cheap-side shifting |
//! | [`matcher`] | [`StreamMatcher`] - bounded-memory pattern search over a stream segment |
//! | [`codec`]   | Endian-aware get / set / read of 8-64 bit integers and half / single / double floats, null-terminated strings |
//! | [`bitwise`] | AND / OR / XOR against a byte or keystream, scalar plus SIMD backends |
//! | [`pool`]    | [`BufferPool`] - size-classed byte buffer reuse |
//!
//! # Typical flow
//! ```no_run
//! use std::fs::File;
//! use std::io::Read;
//! use rekit::{CacheOptions, ChunkCache, Codec, matcher};
//!
//! # fn main() -> rekit::Result<()> {
//! let mut archive = ChunkCache::new(File::open("data.pak")?, CacheOptions::default())?;
//! if let Some(table) = matcher::find_first(&mut archive, .., b"TBL0")? {
//!     let codec = Codec::little();
//!     let count: u32 = codec.read_at(&mut archive, table + 4)?;
//!     let mut payload = vec![0u8; count as usize];
//!     archive.read_exact(&mut payload)?;
//!     rekit::bitwise::apply_xor(&mut payload, 0x5A);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//! Events are emitted through [`tracing`]; install a subscriber to see them.

pub mod bitwise;
pub mod cache;
pub mod codec;
pub mod error;
pub mod matcher;
pub mod pool;
pub mod recency;
pub(crate) mod utils;

pub use bitwise::{Backend, BitwiseTransform, Op, SequenceBehaviour};
pub use cache::{Allocation, CacheOptions, CacheStats, ChunkCache};
pub use codec::{Codec, NullString, Primitive};
pub use error::{Error, Result};
pub use matcher::{MatchOptions, Matches, StreamMatcher};
pub use pool::{BufferPool, PooledBuffer};
pub use recency::RecencyList;
