// Read performance benchmarks for duolog

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use duolog::{Engine, Options};
use rand::Rng;
use std::hint::black_box;
use tempfile::TempDir;

fn benchmark_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_read");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let engine = Engine::open(temp_dir.path(), Options::default()).unwrap();

            for i in 0..size {
                let key = format!("key{:08}", i);
                let value = format!("value{:08}", i);
                engine.set(key.as_bytes(), value.as_bytes()).unwrap();
            }

            b.iter(|| {
                for i in 0..size {
                    let key = format!("key{:08}", i);
                    black_box(engine.get(key.as_bytes()).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_random_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_read");

    let size = 10_000u32;
    group.throughput(Throughput::Elements(1));
    group.bench_function(BenchmarkId::from_parameter(size), |b| {
        let temp_dir = TempDir::new().unwrap();
        let engine = Engine::open(temp_dir.path(), Options::default()).unwrap();

        for i in 0..size {
            let key = format!("key{:08}", i);
            let value = format!("value{:08}", i);
            engine.set(key.as_bytes(), value.as_bytes()).unwrap();
        }

        let mut rng = rand::rng();
        b.iter(|| {
            let i = rng.random_range(0..size);
            let key = format!("key{:08}", i);
            black_box(engine.get(key.as_bytes()).unwrap());
        });
    });

    group.finish();
}

fn benchmark_miss_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("miss_read");

    group.bench_function("absent_key", |b| {
        let temp_dir = TempDir::new().unwrap();
        let engine = Engine::open(temp_dir.path(), Options::default()).unwrap();

        for i in 0..1000 {
            let key = format!("key{:08}", i);
            engine.set(key.as_bytes(), b"value").unwrap();
        }

        b.iter(|| {
            black_box(engine.get(b"missing key").unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_read,
    benchmark_random_read,
    benchmark_miss_read
);
criterion_main!(benches);
