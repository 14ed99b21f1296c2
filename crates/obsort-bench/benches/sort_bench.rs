//! End-to-end sort and MergeSplit benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use obsort_bench::{payload_items, random_items};
use obsort_core::merge_split::{MergeSplitStrategy, merge_split};
use obsort_core::rng::seeded_rng;
use obsort_core::{
    AesCtrEnvelope, Envelope, MemoryStore, ObliviousSorter, Record, SortConfig, XorEnvelope,
};

fn bench_sort_sizes(c: &mut Criterion) {
    let sizes: &[usize] = &[256, 1024, 4096];
    let mut group = c.benchmark_group("oblivious_sort");

    for &size in sizes {
        let items = random_items(size, "bench-values");
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("bitonic_z512", size), &size, |b, _| {
            b.iter(|| {
                let store = MemoryStore::new();
                let mut sorter = ObliviousSorter::with_rng(
                    &store,
                    XorEnvelope::default(),
                    SortConfig::new(512),
                    seeded_rng("bench-session"),
                );
                black_box(sorter.sort(&items).expect("sort"));
            });
        });
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let items = random_items(1024, "bench-values");
    let strategies = [
        ("partition", MergeSplitStrategy::PartitionPad),
        ("bitonic", MergeSplitStrategy::Bitonic),
        (
            "streaming_w64",
            MergeSplitStrategy::BitonicStreaming {
                window: MergeSplitStrategy::DEFAULT_WINDOW,
            },
        ),
    ];
    let mut group = c.benchmark_group("merge_split_strategy");

    for (name, strategy) in strategies {
        group.bench_function(name, |b| {
            b.iter(|| {
                let store = MemoryStore::new();
                let config = SortConfig {
                    bucket_capacity: 512,
                    safety_factor: 1,
                    strategy,
                };
                let mut sorter = ObliviousSorter::with_rng(
                    &store,
                    XorEnvelope::default(),
                    config,
                    seeded_rng("bench-session"),
                );
                black_box(sorter.sort(&items).expect("sort"));
            });
        });
    }
    group.finish();
}

fn bench_merge_split_operator(c: &mut Criterion) {
    let z = 512;
    let bucket = |seed: &str| -> Vec<Record> {
        let mut bucket: Vec<Record> = payload_items(z / 2, 32, seed)
            .into_iter()
            .enumerate()
            .map(|(i, item)| Record::real(item.sort_key, item.payload, i as u32 % 8, i as u32))
            .collect();
        bucket.resize(z, Record::dummy());
        bucket
    };
    let b1 = bucket("bench-b1");
    let b2 = bucket("bench-b2");

    let mut group = c.benchmark_group("merge_split_operator");
    for (name, strategy) in [
        ("partition", MergeSplitStrategy::PartitionPad),
        ("bitonic", MergeSplitStrategy::Bitonic),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(merge_split(&b1, &b2, 0, 3, z, strategy).expect("merge")));
        });
    }
    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let z = 512;
    let bucket: Vec<Record> = payload_items(z, 32, "bench-envelope")
        .into_iter()
        .map(|item| Record::real(item.sort_key, item.payload, 0, 0))
        .collect();
    let envelope = AesCtrEnvelope::new(&mut seeded_rng("bench-key"));

    let mut group = c.benchmark_group("aes_ctr_envelope");
    group.throughput(Throughput::Elements(z as u64));
    group.bench_function("seal", |b| {
        b.iter(|| black_box(envelope.seal(&bucket)));
    });
    let sealed = envelope.seal(&bucket);
    group.bench_function("open", |b| {
        b.iter(|| black_box(envelope.open(&sealed).expect("open")));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_sort_sizes,
    bench_strategies,
    bench_merge_split_operator,
    bench_envelope
);
criterion_main!(benches);
