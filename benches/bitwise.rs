//! Throughput of each bitwise backend.
//!
//! Groups:
//! - **bitwise/byte**: XOR against a single byte.
//! - **bitwise/keystream**: XOR against a repeated 13-byte key and a
//!   buffer-length key.
//!
//! Buffers start one byte past an aligned address so every backend pays for
//! its scalar head.
//!
//! ```bash
//! cargo bench --bench bitwise
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rekit::bitwise::{Backend, BitwiseTransform, SequenceBehaviour};

const SIZES: [usize; 3] = [1 << 10, 64 << 10, 1 << 20];

fn buffer(len: usize) -> Vec<u8> {
    (0..len + 1).map(|i| (i * 7) as u8).collect()
}

fn bench_single_byte(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitwise/byte");
    for len in SIZES {
        group.throughput(Throughput::Bytes(len as u64));
        let mut buf = buffer(len);
        for backend in Backend::supported() {
            let Some(t) = BitwiseTransform::new(backend) else {
                continue;
            };
            group.bench_with_input(BenchmarkId::new(backend.name(), len), &len, |b, _| {
                b.iter(|| t.xor(black_box(&mut buf[1..]), 0xD5))
            });
        }
    }
    group.finish();
}

fn bench_keystream(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitwise/keystream");
    let short_key: Vec<u8> = (1..=13).collect();
    for len in SIZES {
        group.throughput(Throughput::Bytes(len as u64));
        let mut buf = buffer(len);
        let long_key = buffer(len);
        for backend in Backend::supported() {
            let Some(t) = BitwiseTransform::new(backend) else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{backend}/repeat13"), len),
                &len,
                |b, _| b.iter(|| t.xor_with(black_box(&mut buf[1..]), &short_key, SequenceBehaviour::Repeat)),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("{backend}/full"), len),
                &len,
                |b, _| b.iter(|| t.xor_with(black_box(&mut buf[1..]), &long_key, SequenceBehaviour::Truncate)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_single_byte, bench_keystream);
criterion_main!(benches);
