//! Benchmarks comparing nexus-seq containers against their std counterparts.
//!
//! Run with: cargo bench --bench sequence

use std::collections::LinkedList as StdList;
use std::hint::black_box;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use nexus_seq::{DynamicArray, LinkedList};

const COUNT: usize = 10_000;

// ============================================================================
// Push Back
// ============================================================================

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");
    group.throughput(Throughput::Elements(COUNT as u64));

    group.bench_function("DynamicArray", |b| {
        b.iter(|| {
            let mut array = DynamicArray::new();
            for i in 0..COUNT as u64 {
                array.push_back(black_box(i));
            }
            array
        });
    });

    group.bench_function("Vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..COUNT as u64 {
                vec.push(black_box(i));
            }
            vec
        });
    });

    group.bench_function("LinkedList", |b| {
        b.iter(|| {
            let mut list = LinkedList::new();
            for i in 0..COUNT as u64 {
                list.push_back(black_box(i));
            }
            list
        });
    });

    group.bench_function("std::LinkedList", |b| {
        b.iter(|| {
            let mut list = StdList::new();
            for i in 0..COUNT as u64 {
                list.push_back(black_box(i));
            }
            list
        });
    });

    group.finish();
}

// ============================================================================
// Insert Front (shifting vs relinking)
// ============================================================================

fn bench_insert_front(c: &mut Criterion) {
    const SMALL: usize = 1_000;

    let mut group = c.benchmark_group("insert_front");
    group.throughput(Throughput::Elements(SMALL as u64));

    group.bench_function("DynamicArray", |b| {
        b.iter(|| {
            let mut array = DynamicArray::new();
            for i in 0..SMALL as u64 {
                array.insert(array.begin(), black_box(i));
            }
            array
        });
    });

    group.bench_function("LinkedList", |b| {
        b.iter(|| {
            let mut list = LinkedList::new();
            for i in 0..SMALL as u64 {
                list.insert(list.begin(), black_box(i));
            }
            list
        });
    });

    group.finish();
}

// ============================================================================
// Splice
// ============================================================================

fn bench_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice");

    group.bench_function("LinkedList/all", |b| {
        b.iter_batched(
            || {
                let list: LinkedList<u64> = (0..COUNT as u64).collect();
                let donor: LinkedList<u64> = (0..COUNT as u64).collect();
                (list, donor)
            },
            |(mut list, mut donor)| {
                let middle = list.next(list.begin());
                list.splice(middle, &mut donor);
                (list, donor)
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("std::LinkedList/append", |b| {
        b.iter_batched(
            || {
                let list: StdList<u64> = (0..COUNT as u64).collect();
                let donor: StdList<u64> = (0..COUNT as u64).collect();
                (list, donor)
            },
            |(mut list, mut donor)| {
                list.append(&mut donor);
                (list, donor)
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// Sort
// ============================================================================

fn scrambled(n: usize) -> impl Iterator<Item = u64> {
    (0..n as u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15) >> 40)
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    group.throughput(Throughput::Elements(COUNT as u64));

    group.bench_function("LinkedList", |b| {
        b.iter_batched(
            || scrambled(COUNT).collect::<LinkedList<u64>>(),
            |mut list| {
                list.sort();
                list
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("DynamicArray", |b| {
        b.iter_batched(
            || scrambled(COUNT).collect::<DynamicArray<u64>>(),
            |mut array| {
                array.sort();
                array
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_push_back,
    bench_insert_front,
    bench_splice,
    bench_sort
);
criterion_main!(benches);
