//! Array access and dump/restore benchmarks using criterion.
//!
//! Run with: cargo bench --bench array_access

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use residency::{Array, BufferManager, ElementType, ManagerConfig};
use std::sync::Arc;

fn create_manager() -> (Arc<BufferManager>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ManagerConfig::default().with_temp_parent(dir.path());
    (Arc::new(BufferManager::with_config(config).unwrap()), dir)
}

fn bench_element_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("element_access");
    let (manager, _dir) = create_manager();
    let array = Array::with_layout(Arc::clone(&manager), &[64, 64, 64], ElementType::F32, 1).unwrap();
    let lock = array.lock().unwrap();

    group.throughput(Throughput::Elements(array.num_elements() as u64));

    group.bench_function("at_indexed", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for z in 0..64 {
                for y in 0..64 {
                    for x in 0..64 {
                        sum += *lock.at::<f32>(&[x, y, z]).unwrap();
                    }
                }
            }
            black_box(sum)
        });
    });

    group.bench_function("iter", |b| {
        b.iter(|| black_box(lock.iter::<f32>().unwrap().sum::<f32>()));
    });

    group.bench_function("slice", |b| {
        b.iter(|| black_box(lock.as_slice::<f32>().unwrap().iter().sum::<f32>()));
    });

    group.finish();
}

fn bench_lock(c: &mut Criterion) {
    let (manager, _dir) = create_manager();
    let id = manager.register(4096).unwrap();

    c.bench_function("lock_resident", |b| {
        b.iter(|| black_box(manager.lock(id).unwrap()));
    });
}

fn bench_dump_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump_restore");
    let (manager, _dir) = create_manager();

    for size in [4 * 1024, 256 * 1024, 4 * 1024 * 1024] {
        let id = manager.register(size).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &id, |b, &id| {
            b.iter(|| {
                manager.dump(id).unwrap();
                manager.restore(id).unwrap();
            });
        });
        manager.unregister(id).unwrap();
    }

    group.finish();
}

criterion_group!(benches, bench_element_access, bench_lock, bench_dump_restore);
criterion_main!(benches);
