use std::env;
use std::fs::File;
use std::io::Read;

use rekit::bitwise::{self, SequenceBehaviour};
use rekit::codec::Codec;
use rekit::{CacheOptions, ChunkCache, MatchOptions, Result, StreamMatcher};

/// Usage: `scan <file> <magic> [xor-key]`
///
/// Lists every offset of `magic` in `file` together with the little-endian
/// `u32` that follows it, and previews the next 16 bytes (XOR-decoded with
/// `xor-key` if one is given).
fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(path), Some(magic)) = (args.next(), args.next()) else {
        eprintln!("usage: scan <file> <magic> [xor-key]");
        return Ok(());
    };
    let key = args.next().map(String::into_bytes).unwrap_or_default();

    let mut archive = ChunkCache::new(File::open(&path)?, CacheOptions::default())?;
    let matcher = StreamMatcher::new(&magic, MatchOptions::default())?;
    let codec = Codec::little();

    let offsets = matcher.find_all(&mut archive, ..)?;
    println!("{path}: {} match(es) for {magic:?}", offsets.len());

    for offset in offsets {
        let value: u32 = codec.read_at(&mut archive, offset + magic.len() as u64)?;
        let mut preview = [0u8; 16];
        let n = archive.read(&mut preview)?;
        bitwise::apply_xor_with(&mut preview[..n], &key, SequenceBehaviour::Repeat);
        println!("{offset:#010x}  u32={value:#010x}  {:02x?}", &preview[..n]);
    }

    let stats = archive.stats();
    println!(
        "cache: {} hits, {} misses, {} evictions, {} bypass reads",
        stats.hits, stats.misses, stats.evictions, stats.bypass_reads
    );
    Ok(())
}
