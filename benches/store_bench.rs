//! Benchmarks for store operations

use criterion::{criterion_group, criterion_main, Criterion};

use corkboard::{Config, Store, SyncStrategy};
use tempfile::TempDir;

fn store_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(dir.path())
        .sync_strategy(SyncStrategy::EveryNCommits { count: 1000 })
        .build();
    let store = Store::open(config).unwrap();

    for i in 0..1000u32 {
        store
            .insert(&format!("key{:06}", i), b"benchmark value payload")
            .unwrap();
    }

    c.bench_function("store_get", |b| {
        b.iter(|| store.get("key000500").unwrap())
    });

    let mut n = 0u64;
    c.bench_function("store_insert", |b| {
        b.iter(|| {
            n += 1;
            store
                .insert(&format!("bench{:010}", n), b"benchmark value payload")
                .unwrap()
        })
    });

    c.bench_function("store_scan", |b| b.iter(|| store.iter().count()));
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
