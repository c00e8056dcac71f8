//! Rate-tree benchmarks: the O(log n) claims for upsert, erase, and locate,
//! plus the mixed workload a busy scheduler produces.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use poisson_scheduler::RateTree;

fn populated_tree(size: u64) -> RateTree<u64> {
    let mut tree = RateTree::new();
    let mut rng = ChaCha8Rng::seed_from_u64(size);
    for key in 0..size {
        tree.upsert(key, rng.gen_range(0.5..10.0));
    }
    tree
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_tree/upsert");
    for size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let tree = populated_tree(size);
            let mut next = size;
            b.iter_batched_ref(
                || tree_clone(&tree, size),
                |tree| {
                    next = next.wrapping_add(1);
                    tree.upsert(black_box(next % (size * 2)), 1.5);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_tree/locate");
    for size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let tree = populated_tree(size);
            let total = tree.total();
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| {
                let point: f64 = rng.gen::<f64>() * total;
                black_box(tree.locate(black_box(point)));
            });
        });
    }
    group.finish();
}

fn bench_erase_insert_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_tree/erase_insert");
    for size in [1_000u64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut tree = populated_tree(size);
            let mut key = 0u64;
            b.iter(|| {
                key = (key + 1) % size;
                tree.erase(&key);
                tree.upsert(key, 2.0);
            });
        });
    }
    group.finish();
}

// RateTree deliberately has no Clone; rebuild for batched benchmarks.
fn tree_clone(tree: &RateTree<u64>, size: u64) -> RateTree<u64> {
    let mut copy = RateTree::new();
    for key in 0..size {
        let rate = tree.rate_of(&key);
        if rate > 0.0 {
            copy.upsert(key, rate);
        }
    }
    copy
}

criterion_group!(benches, bench_upsert, bench_locate, bench_erase_insert_cycle);
criterion_main!(benches);
