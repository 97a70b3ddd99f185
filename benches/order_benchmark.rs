//! Ordering engine benchmarks.
//!
//! Measures `ordering::order` on shuffled threads of growing size, plus a
//! full synchronizer reorder against the in-memory host.
//!
//! Run with: cargo bench --bench order_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::block_on;
use std::rc::Rc;
use thread_order::host::{MemoryContainer, MemoryControl, MemoryEntry, MemoryThread};
use thread_order::model::{OrderPreference, ViewId};
use thread_order::store::memory::MemoryStore;
use thread_order::store::{StoreChange, DEFAULT_PREFERENCE_KEY};
use thread_order::sync::ViewSynchronizer;

/// Ids in a scrambled but deterministic order.
fn scrambled(n: usize) -> Vec<MemoryEntry> {
    (0..n as u64)
        .map(|i| MemoryEntry::new(i.wrapping_mul(7919) % (n as u64 * 2 + 1)))
        .collect()
}

fn bench_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("order");
    for size in [10usize, 100, 1_000, 10_000] {
        let entries = scrambled(size);
        for preference in OrderPreference::ALL {
            group.bench_with_input(BenchmarkId::new(preference.to_string(), size), &entries, |b, entries| {
                b.iter(|| thread_order::ordering::order(black_box(entries), preference))
            });
        }
    }
    group.finish();
}

fn bench_toggle_reorder(c: &mut Criterion) {
    let entries = MemoryContainer::new(scrambled(1_000));
    let thread = MemoryThread::from_parts(
        ViewId::new("bench").expect("valid view id"),
        Some(entries),
        Some(MemoryControl::new()),
    );
    let store = MemoryStore::new();
    let mut sync = block_on(ViewSynchronizer::bind_thread(&thread, Rc::new(store), DEFAULT_PREFERENCE_KEY))
        .expect("thread binds");

    let mut reversed = false;
    c.bench_function("toggle_reorder_1000", |b| {
        b.iter(|| {
            reversed = !reversed;
            let preference = if reversed { OrderPreference::Reversed } else { OrderPreference::Default };
            let change = StoreChange {
                old_value: None,
                new_value: Some(preference.to_stored()),
            };
            black_box(sync.on_preference_changed(&change))
        })
    });
}

criterion_group!(benches, bench_order, bench_toggle_reorder);
criterion_main!(benches);
