use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::io::{Cursor, sink};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crc32par::crc::{self, FileSource};
use crc32par::fanout::{self, Order, RunConfig};

/// Create test data of the given size for benchmarking.
fn make_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn bench_checksum_reader(c: &mut Criterion) {
    let sizes = [1024, 64 * 1024, 1024 * 1024, 10 * 1024 * 1024];

    let mut group = c.benchmark_group("checksum_reader");
    for &size in &sizes {
        let data = make_test_data(size);
        let label = if size >= 1024 * 1024 {
            format!("{}MB", size / (1024 * 1024))
        } else {
            format!("{}KB", size / 1024)
        };

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("streamed", &label), &data, |b, data| {
            b.iter(|| crc::checksum_reader(Cursor::new(data)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("one_shot", &label), &data, |b, data| {
            b.iter(|| crc::checksum_bytes(data));
        });
    }
    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    // 16 x 4MB files in a scratch directory
    let dir = tempfile::tempdir().unwrap();
    let data = make_test_data(4 * 1024 * 1024);
    let paths: Vec<PathBuf> = (0..16)
        .map(|i| {
            let p = dir.path().join(format!("file_{}.bin", i));
            std::fs::write(&p, &data).unwrap();
            p
        })
        .collect();

    let mut group = c.benchmark_group("fanout");
    group.sample_size(10);
    group.throughput(Throughput::Bytes((data.len() * paths.len()) as u64));

    let configs = [
        ("unordered_unbounded", Order::Unordered, None),
        ("ordered_unbounded", Order::Ordered, None),
        ("ordered_jobs4", Order::Ordered, NonZeroUsize::new(4)),
    ];
    for (name, order, jobs) in configs {
        let config = RunConfig { order, jobs };
        group.bench_function(name, |b| {
            b.iter(|| fanout::run(&FileSource, &paths, &config, &mut sink()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_checksum_reader, bench_fanout);
criterion_main!(benches);
