//! Flurry benchmark suite.
//!
//! Benchmarks for the synchronous part of file intake:
//! - Decoding CSV and JSONL content
//! - Normalization and validation
//! - Batch partitioning

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};


use flurry::batch::{MAX_EVENTS_PER_INGEST_BATCH, partition};
use flurry::event::{normalize_all, partition_valid};
use flurry::source::{FileFormat, decode};

fn decode_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        let jsonl = bench_utils::generate_jsonl(size);
        group.bench_with_input(BenchmarkId::new("jsonl", size), &jsonl, |b, data| {
            b.iter(|| decode(FileFormat::Jsonl, "bench.jsonl", data.as_bytes()).unwrap());
        });

        let csv = bench_utils::generate_csv(size);
        group.bench_with_input(BenchmarkId::new("csv", size), &csv, |b, data| {
            b.iter(|| decode(FileFormat::Csv, "bench.csv", data.as_bytes()).unwrap());
        });
    }

    group.finish();
}

/// Decode through to batches, as the pipeline does before dispatch.
fn intake_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("intake");

    for size in [1000, 10000] {
        let jsonl = bench_utils::generate_jsonl(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("to_batches", size), &jsonl, |b, data| {
            b.iter(|| {
                let raw = decode(FileFormat::Jsonl, "bench.jsonl", data.as_bytes()).unwrap();
                let partitioned = partition_valid(normalize_all(raw));
                partition(partitioned.valid, MAX_EVENTS_PER_INGEST_BATCH)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, decode_benchmarks, intake_benchmarks);
criterion_main!(benches);
