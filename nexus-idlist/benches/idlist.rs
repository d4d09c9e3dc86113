//! Benchmarks comparing IdList against a locked BTreeMap.
//!
//! Run with: cargo bench
//!
//! The BTreeMap sits behind the same `parking_lot::Mutex` so both sides pay
//! for one lock per operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_idlist::{IdList, Identified, ListConfig, Node};
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

struct Order {
    id: i64,
}

impl Identified for Order {
    fn id(&self) -> i64 {
        self.id
    }
}

fn shuffled_ids(n: usize) -> Vec<i64> {
    let mut ids: Vec<i64> = (0..n as i64).map(|i| i * 2).collect();
    ids.shuffle(&mut SmallRng::seed_from_u64(42));
    ids
}

fn populated_list(ids: &[i64], block_size: usize) -> IdList<Order> {
    let config = ListConfig::new().block_size(block_size).capacity(ids.len() + 1);
    let list = IdList::with_config(config).unwrap();
    for &id in ids {
        list.add(&Node::owning(Order { id })).unwrap();
    }
    list
}

fn populated_map(ids: &[i64]) -> Mutex<BTreeMap<i64, Arc<Order>>> {
    Mutex::new(ids.iter().map(|&id| (id, Arc::new(Order { id }))).collect())
}

// ============================================================================
// Bulk insert (random order)
// ============================================================================

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_random");

    for n in SIZES {
        let ids = shuffled_ids(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("idlist", n), &ids, |b, ids| {
            b.iter(|| black_box(populated_list(ids, nexus_idlist::DEFAULT_BLOCK_SIZE)));
        });

        group.bench_with_input(BenchmarkId::new("btreemap", n), &ids, |b, ids| {
            b.iter(|| black_box(populated_map(ids)));
        });
    }

    group.finish();
}

// ============================================================================
// Lookup
// ============================================================================

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for n in SIZES {
        let ids = shuffled_ids(n);
        let list = populated_list(&ids, nexus_idlist::DEFAULT_BLOCK_SIZE);
        let map = populated_map(&ids);
        group.throughput(Throughput::Elements(ids.len() as u64));

        group.bench_function(BenchmarkId::new("idlist", n), |b| {
            b.iter(|| {
                for &id in &ids {
                    black_box(list.get(id));
                }
            });
        });

        group.bench_function(BenchmarkId::new("btreemap", n), |b| {
            b.iter(|| {
                for &id in &ids {
                    black_box(map.lock().get(&id).cloned());
                }
            });
        });
    }

    group.finish();
}

// ============================================================================
// Remove + re-add in the middle
// ============================================================================

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn_middle");

    for n in SIZES {
        let ids = shuffled_ids(n);
        let list = populated_list(&ids, nexus_idlist::DEFAULT_BLOCK_SIZE);
        let map = populated_map(&ids);
        let target = n as i64 + 1;
        let node = Node::owning(Order { id: target });
        let value = Arc::new(Order { id: target });

        group.bench_function(BenchmarkId::new("idlist", n), |b| {
            b.iter(|| {
                list.add(&node).unwrap();
                black_box(list.remove(target));
            });
        });

        group.bench_function(BenchmarkId::new("btreemap", n), |b| {
            b.iter(|| {
                map.lock().insert(target, Arc::clone(&value));
                black_box(map.lock().remove(&target));
            });
        });
    }

    group.finish();
}

// ============================================================================
// Block size sweep
// ============================================================================

fn bench_block_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_size");
    let ids = shuffled_ids(100_000);

    for block_size in [4, 8, 15, 32, 64] {
        let list = populated_list(&ids, block_size);
        group.bench_function(BenchmarkId::new("get", block_size), |b| {
            b.iter(|| {
                for &id in ids.iter().take(1_000) {
                    black_box(list.get(id));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_get, bench_churn, bench_block_size);
criterion_main!(benches);
