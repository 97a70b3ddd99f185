//! Tests for the view synchronizer.
//!
//! The host side is played by the in-memory containers: tests keep a clone
//! of each container and mutate it the way the host application would.

use super::*;
use crate::host::{MemoryEntry, MemoryThread, MutationKind};
use crate::model::{MalformedReason, StoreError};
use crate::store::{MemoryStore, DEFAULT_PREFERENCE_KEY};
use crate::test_harness::{bind, shared, store_with, view, MemorySync, ThreadFixture};
use futures::executor::{block_on, LocalPool};
use serde_json::json;

fn change_to(preference: OrderPreference) -> StoreChange {
    StoreChange {
        old_value: None,
        new_value: Some(preference.to_stored()),
    }
}

// ===== Binding =====

#[test]
fn bind_orders_ascending_for_default() {
    let fixture = ThreadFixture::with_ids("t1", &[3, 1, 2]);
    let sync = bind(&fixture, &store_with(Some(OrderPreference::Default)));

    assert_eq!(fixture.entries.ids(), vec![1, 2, 3]);
    assert_eq!(sync.state(), SyncState::Bound { observed_count: 3 });
    assert_eq!(sync.generation(), 1);
}

#[test]
fn bind_orders_descending_for_reversed() {
    let fixture = ThreadFixture::with_ids("t1", &[3, 1, 2]);
    let sync = bind(&fixture, &store_with(Some(OrderPreference::Reversed)));

    assert_eq!(fixture.entries.ids(), vec![3, 2, 1]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Reversed));
    assert_eq!(sync.preference(), OrderPreference::Reversed);
}

#[test]
fn absent_preference_binds_as_default_with_default_selected() {
    let fixture = ThreadFixture::with_ids("t1", &[2, 1]);
    let sync = bind(&fixture, &store_with(None));

    assert_eq!(fixture.entries.ids(), vec![1, 2]);
    let toggle = fixture.control.rendered().expect("toggle rendered");
    assert_eq!(toggle.caption, "Default Order");
    assert_eq!(toggle.selected(), Some(OrderPreference::Default));
    assert_eq!(toggle.selected_count(), 1);
    assert_eq!(
        sync.last_reaction(),
        &Reaction::Reordered {
            preference: OrderPreference::Default,
            count: 2
        }
    );
}

#[test]
fn failed_read_during_bind_degrades_to_default() {
    let store = store_with(Some(OrderPreference::Reversed));
    store.fail_next_reads(1);
    let fixture = ThreadFixture::with_ids("t1", &[3, 1, 2]);
    let sync = bind(&fixture, &store);

    assert_eq!(fixture.entries.ids(), vec![1, 2, 3]);
    assert_eq!(sync.preference(), OrderPreference::Default);
    assert_eq!(fixture.shown(), Some(OrderPreference::Default));
}

#[test]
fn missing_entries_container_leaves_view_unbound() {
    let thread = MemoryThread::from_parts(view("t1"), None, Some(Default::default()));
    let result: Result<MemorySync, _> = block_on(ViewSynchronizer::bind_thread(
        &thread,
        shared(&MemoryStore::new()),
        DEFAULT_PREFERENCE_KEY,
    ));

    match result {
        Err(SyncError::ContainerNotFound { view: id, container }) => {
            assert_eq!(id, view("t1"));
            assert_eq!(container, ContainerKind::Entries);
        }
        other => panic!("expected ContainerNotFound, got {:?}", other),
    }
}

#[test]
fn missing_control_container_leaves_view_unbound() {
    let thread = MemoryThread::from_parts(view("t1"), Some(Default::default()), None);
    let result: Result<MemorySync, _> =
        ViewSynchronizer::attach(&thread, shared(&MemoryStore::new()), DEFAULT_PREFERENCE_KEY);

    assert!(matches!(
        result,
        Err(SyncError::ContainerNotFound {
            container: ContainerKind::Controls,
            ..
        })
    ));
}

#[test]
fn attached_view_is_unbound_and_ignores_notifications() {
    let fixture = ThreadFixture::with_ids("t1", &[2, 1]);
    let mut sync: MemorySync =
        ViewSynchronizer::attach(&fixture.thread, shared(&MemoryStore::new()), DEFAULT_PREFERENCE_KEY)
            .unwrap();

    assert_eq!(sync.state(), SyncState::Unbound);
    assert_eq!(sync.observed_count(), None);
    assert_eq!(sync.on_preference_changed(&change_to(OrderPreference::Reversed)), Reaction::Ignored);
    fixture.entries.push(MemoryEntry::new(3));
    let reaction = block_on(sync.on_child_list_changed(&MutationBatch::child_list(1, 0))).unwrap();
    assert_eq!(reaction, Reaction::Ignored);
    assert_eq!(fixture.entries.ids(), vec![2, 1, 3], "unbound views never reorder");
}

#[test]
fn malformed_entry_skips_reorder_but_binds() {
    let fixture = ThreadFixture::with_entries(
        "t1",
        vec![
            MemoryEntry::new(2),
            MemoryEntry::with_raw_id(None, "system note"),
            MemoryEntry::new(1),
        ],
    );
    let sync = bind(&fixture, &store_with(Some(OrderPreference::Reversed)));

    assert_eq!(fixture.entries.labels(), vec!["2", "system note", "1"]);
    assert_eq!(fixture.entries.replacements(), 0, "container untouched");
    assert_eq!(sync.state(), SyncState::Bound { observed_count: 3 });
    assert_eq!(fixture.shown(), Some(OrderPreference::Reversed));
    match sync.last_reaction() {
        Reaction::Skipped { malformed, .. } => {
            assert_eq!(malformed.position(), 1);
            assert_eq!(malformed.reason(), &MalformedReason::Missing);
        }
        other => panic!("expected Skipped, got {:?}", other),
    }
}

// ===== Self-trigger guard =====

#[test]
fn own_reorder_does_not_retrigger() {
    let fixture = ThreadFixture::with_ids("t1", &[3, 1, 2]);
    let mut sync = bind(&fixture, &store_with(None));
    let mut batches = fixture.entries.watch_child_list();

    let reaction = sync.on_preference_changed(&change_to(OrderPreference::Reversed));
    assert_eq!(
        reaction,
        Reaction::Reordered {
            preference: OrderPreference::Reversed,
            count: 3
        }
    );
    assert_eq!(sync.observed_count(), Some(3));
    let generation = sync.generation();

    let batch = block_on(batches.next()).expect("reorder produced a batch");
    assert_eq!(batch, MutationBatch::child_list(3, 3));
    let reaction = block_on(sync.on_child_list_changed(&batch)).unwrap();

    assert_eq!(reaction, Reaction::Ignored);
    assert_eq!(sync.generation(), generation, "no second reorder");
    assert_eq!(sync.observed_count(), Some(3));
    assert_eq!(fixture.entries.ids(), vec![3, 2, 1]);
}

#[test]
fn non_child_list_batches_are_ignored() {
    let fixture = ThreadFixture::with_ids("t1", &[1, 2]);
    let mut sync = bind(&fixture, &store_with(None));
    fixture.entries.push(MemoryEntry::new(0));

    let attrs = MutationBatch {
        kind: MutationKind::Attributes,
        added: 0,
        removed: 0,
    };
    assert_eq!(block_on(sync.on_child_list_changed(&attrs)).unwrap(), Reaction::Ignored);
}

#[test]
fn same_count_host_change_is_not_detected() {
    let fixture = ThreadFixture::with_ids("t1", &[1, 2, 3]);
    let mut sync = bind(&fixture, &store_with(None));

    fixture.entries.swap_child(0, MemoryEntry::new(9));
    let reaction = block_on(sync.on_child_list_changed(&MutationBatch::child_list(1, 1))).unwrap();

    assert_eq!(reaction, Reaction::Ignored);
    assert_eq!(fixture.entries.ids(), vec![9, 2, 3], "count-based detection misses swaps");
}

// ===== Host-driven changes =====

#[test]
fn host_append_updates_count_and_reorders() {
    let fixture = ThreadFixture::with_ids("t1", &[1, 2, 3]);
    let mut sync = bind(&fixture, &store_with(Some(OrderPreference::Reversed)));
    assert_eq!(sync.observed_count(), Some(3));

    fixture.entries.push(MemoryEntry::new(4));
    let reaction = block_on(sync.on_child_list_changed(&MutationBatch::child_list(1, 0))).unwrap();

    assert_eq!(
        reaction,
        Reaction::Reordered {
            preference: OrderPreference::Reversed,
            count: 4
        }
    );
    assert_eq!(sync.observed_count(), Some(4));
    assert_eq!(fixture.entries.ids(), vec![4, 3, 2, 1]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Reversed));
}

#[test]
fn host_removal_rereads_current_preference() {
    let store = store_with(None);
    let fixture = ThreadFixture::with_ids("t1", &[1, 2, 3]);
    let mut sync = bind(&fixture, &store);

    // Written elsewhere; this view has not seen the notification yet.
    store.write(DEFAULT_PREFERENCE_KEY, json!(true)).unwrap();
    fixture.entries.remove(0);
    block_on(sync.on_child_list_changed(&MutationBatch::child_list(0, 1))).unwrap();

    assert_eq!(fixture.entries.ids(), vec![3, 2]);
    assert_eq!(sync.observed_count(), Some(2));
}

#[test]
fn read_failure_after_host_change_surfaces() {
    let store = store_with(Some(OrderPreference::Reversed));
    let fixture = ThreadFixture::with_ids("t1", &[1, 2]);
    let mut sync = bind(&fixture, &store);

    store.fail_next_reads(1);
    fixture.entries.push(MemoryEntry::new(3));
    let result = block_on(sync.on_child_list_changed(&MutationBatch::child_list(1, 0)));

    assert!(matches!(result, Err(SyncError::StoreAccess(StoreError::Read { .. }))));
    assert_eq!(sync.observed_count(), Some(3), "count is reconciled even on failure");
    assert_eq!(fixture.entries.ids(), vec![2, 1, 3], "order left as is");
}

// ===== Preference changes =====

#[test]
fn preference_change_reorders_and_refreshes_toggle() {
    let fixture = ThreadFixture::with_ids("t1", &[2, 3, 1]);
    let mut sync = bind(&fixture, &store_with(None));
    assert_eq!(fixture.shown(), Some(OrderPreference::Default));

    sync.on_preference_changed(&change_to(OrderPreference::Reversed));
    assert_eq!(fixture.entries.ids(), vec![3, 2, 1]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Reversed));

    sync.on_preference_changed(&change_to(OrderPreference::Default));
    assert_eq!(fixture.entries.ids(), vec![1, 2, 3]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Default));
}

#[test]
fn removed_preference_means_default() {
    let fixture = ThreadFixture::with_ids("t1", &[1, 2]);
    let mut sync = bind(&fixture, &store_with(Some(OrderPreference::Reversed)));

    sync.on_preference_changed(&StoreChange {
        old_value: Some(json!(true)),
        new_value: None,
    });
    assert_eq!(sync.preference(), OrderPreference::Default);
    assert_eq!(fixture.entries.ids(), vec![1, 2]);
}

// ===== Event loop =====

#[test]
fn click_is_written_and_reconciled_through_the_store() {
    let store = store_with(None);
    let fixture = ThreadFixture::with_ids("t1", &[1, 2, 3]);
    let sync = bind(&fixture, &store);

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let events = sync.subscribe();
    let handle = spawner
        .spawn_local_with_handle(sync.run(events, pool.spawner()))
        .expect("spawn watch");

    fixture.control.click(OrderPreference::Reversed);
    pool.run_until_stalled();

    assert_eq!(store.peek(DEFAULT_PREFERENCE_KEY), Some(json!(true)));
    assert_eq!(fixture.entries.ids(), vec![3, 2, 1]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Reversed));
    assert_eq!(fixture.entries.replacements(), 2, "bind plus one reorder, no echo");

    fixture.entries.dispose();
    let sync = pool.run_until(handle);
    assert_eq!(sync.generation(), 2);
}

#[test]
fn failed_click_write_leaves_order_alone() {
    let store = store_with(None);
    let fixture = ThreadFixture::with_ids("t1", &[1, 2]);
    let sync = bind(&fixture, &store);

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let writes = pool.spawner();
    let events = sync.subscribe();
    spawner
        .spawn_local(async move {
            sync.run(events, writes).await;
        })
        .expect("spawn watch");

    store.fail_next_writes(1);
    fixture.control.click(OrderPreference::Reversed);
    pool.run_until_stalled();

    assert_eq!(store.peek(DEFAULT_PREFERENCE_KEY), None);
    assert_eq!(fixture.entries.ids(), vec![1, 2]);
    assert_eq!(fixture.shown(), Some(OrderPreference::Default));
}
