use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeSet;

use bplus_index::BPlusIndex;

const N: usize = 10_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn reverse_ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).rev().collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn build_index(keys: &[i64]) -> BPlusIndex {
    let mut index = BPlusIndex::new();
    for &k in keys {
        index.insert(k).expect("arena has room");
    }
    index
}

// ─── Insert Benchmarks ──────────────────────────────────────────────────────

fn bench_insert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ordered");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut index = BPlusIndex::new();
            for i in 0..N as i64 {
                index.insert(i).expect("arena has room");
            }
            index
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = BTreeSet::new();
            for i in 0..N as i64 {
                set.insert(i);
            }
            set
        });
    });

    group.finish();
}

fn bench_insert_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_reverse");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut index = BPlusIndex::new();
            for i in (0..N as i64).rev() {
                index.insert(i).expect("arena has room");
            }
            index
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = BTreeSet::new();
            for i in (0..N as i64).rev() {
                set.insert(i);
            }
            set
        });
    });

    group.finish();
}

fn bench_insert_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("insert_random");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut index = BPlusIndex::new();
            for &k in &keys {
                index.insert(k).expect("arena has room");
            }
            index
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut set = BTreeSet::new();
            for &k in &keys {
                set.insert(k);
            }
            set
        });
    });

    group.finish();
}

// ─── Contains Benchmarks ────────────────────────────────────────────────────

fn bench_contains_ordered(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let index = build_index(&keys);
    let bt_set: BTreeSet<i64> = keys.iter().copied().collect();

    let mut group = c.benchmark_group("contains_ordered");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &keys {
                if index.contains(k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &keys {
                if bt_set.contains(&k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.finish();
}

fn bench_contains_reverse(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let index = build_index(&keys);
    let bt_set: BTreeSet<i64> = keys.iter().copied().collect();
    let reverse_keys = reverse_ordered_keys(N);

    let mut group = c.benchmark_group("contains_reverse");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &reverse_keys {
                if index.contains(k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &reverse_keys {
                if bt_set.contains(&k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.finish();
}

fn bench_contains_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let index = build_index(&keys);
    let bt_set: BTreeSet<i64> = keys.iter().copied().collect();

    let mut group = c.benchmark_group("contains_random");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &keys {
                if index.contains(k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut count = 0usize;
            for &k in &keys {
                if bt_set.contains(&k) {
                    count += 1;
                }
            }
            count
        });
    });

    group.finish();
}

// ─── Remove Benchmarks ──────────────────────────────────────────────────────

fn bench_remove_ordered(c: &mut Criterion) {
    let keys = ordered_keys(N);

    let mut group = c.benchmark_group("remove_ordered");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter_batched(
            || build_index(&keys),
            |mut index| {
                for &k in &keys {
                    index.remove(k);
                }
                index
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter_batched(
            || keys.iter().copied().collect::<BTreeSet<i64>>(),
            |mut set| {
                for &k in &keys {
                    set.remove(&k);
                }
                set
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_remove_reverse(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let reverse_keys = reverse_ordered_keys(N);

    let mut group = c.benchmark_group("remove_reverse");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter_batched(
            || build_index(&keys),
            |mut index| {
                for &k in &reverse_keys {
                    index.remove(k);
                }
                index
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter_batched(
            || keys.iter().copied().collect::<BTreeSet<i64>>(),
            |mut set| {
                for &k in &reverse_keys {
                    set.remove(&k);
                }
                set
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("remove_random");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter_batched(
            || build_index(&keys),
            |mut index| {
                for &k in &keys {
                    index.remove(k);
                }
                index
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter_batched(
            || keys.iter().copied().collect::<BTreeSet<i64>>(),
            |mut set| {
                for &k in &keys {
                    set.remove(&k);
                }
                set
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── Scan Benchmarks ────────────────────────────────────────────────────────

fn bench_scan(c: &mut Criterion) {
    let keys = random_keys(N);
    let index = build_index(&keys);
    let bt_set: BTreeSet<i64> = keys.iter().copied().collect();

    let mut group = c.benchmark_group("scan");

    group.bench_function(BenchmarkId::new("BPlusIndex", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for k in &index {
                sum = sum.wrapping_add(k);
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &bt_set {
                sum = sum.wrapping_add(k);
            }
            sum
        });
    });

    group.finish();
}

// ─── Criterion Groups ───────────────────────────────────────────────────────

criterion_group!(insert_benches, bench_insert_ordered, bench_insert_reverse, bench_insert_random,);

criterion_group!(contains_benches, bench_contains_ordered, bench_contains_reverse, bench_contains_random,);

criterion_group!(remove_benches, bench_remove_ordered, bench_remove_reverse, bench_remove_random,);

criterion_group!(scan_benches, bench_scan,);

criterion_main!(insert_benches, contains_benches, remove_benches, scan_benches,);
