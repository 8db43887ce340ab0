//! # Command Queue Benchmark
//!
//! Push and drain throughput for one frame's worth of commands.
//!
//! Run with: `cargo bench --package cadence_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cadence_core::{command_queue, MEGABYTE};

/// Payload roughly the size of a set-position command.
const PAYLOAD: [u8; 20] = [0x5A; 20];

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (writer, mut reader) = command_queue(MEGABYTE);
            b.iter(|| {
                for _ in 0..count {
                    black_box(writer.push_command(3, &PAYLOAD));
                }
                reader.swap().ok();
                reader.clear();
            });
        });
    }

    group.finish();
}

fn bench_swap_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_drain");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (writer, mut reader) = command_queue(MEGABYTE);
            b.iter(|| {
                for _ in 0..count {
                    writer.push_command(3, &PAYLOAD);
                }
                reader.swap().ok();
                let bytes: usize = reader.records().map(|record| record.payload.len()).sum();
                reader.clear();
                black_box(bytes)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push, bench_swap_and_drain);
criterion_main!(benches);
