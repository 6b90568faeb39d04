//! Micro benchmarks for the internal-node page operations.
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tessera::storage::node::internal;
use tessera::storage::node::Separator;
use tessera::types::{PageId, DEFAULT_PAGE_SIZE};

fn keys() -> Vec<Vec<u8>> {
    let mut keys: Vec<Vec<u8>> = (0..200u32)
        .map(|i| format!("key-{i:08}").into_bytes())
        .collect();
    keys.shuffle(&mut ChaCha8Rng::seed_from_u64(0xDECAF));
    keys
}

fn filled_node(keys: &[Vec<u8>]) -> Vec<u8> {
    let mut page = vec![0u8; DEFAULT_PAGE_SIZE];
    internal::init(&mut page).expect("init");
    let mut child = 1u64;
    for key in keys {
        if internal::is_full(&page, key.len()).expect("is_full") {
            break;
        }
        internal::insert(&mut page, key, PageId(child), PageId(child + 1)).expect("insert");
        child += 2;
    }
    page
}

fn micro_node(c: &mut Criterion) {
    let keys = keys();
    let mut group = c.benchmark_group("micro/node");
    group.sample_size(50);

    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("insert_until_full", |b| {
        b.iter(|| black_box(filled_node(&keys)));
    });

    let node = filled_node(&keys);
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("point_lookup", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(internal::lookup(&node, key).expect("lookup"));
            }
        });
    });

    group.bench_function("split", |b| {
        b.iter_batched(
            || (filled_node(&keys), vec![0u8; DEFAULT_PAGE_SIZE]),
            |(mut left, mut right)| {
                black_box(internal::split(&mut left, &mut right).expect("split"));
            },
            BatchSize::SmallInput,
        );
    });

    let probe = keys[0].clone();
    group.bench_function("remove_reinsert", |b| {
        b.iter_batched(
            || filled_node(&keys),
            |mut page| {
                internal::remove(&mut page, Separator::Key(&probe)).expect("remove");
                internal::insert(&mut page, &probe, PageId(900), PageId(901)).expect("insert");
                black_box(page);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, micro_node);
criterion_main!(benches);
