//! Test harness for synchronizer and discovery tests.
//!
//! Builds in-memory threads and stores, and keeps handles to their
//! containers so tests can act as the host while a synchronizer holds
//! clones of the same nodes.

use crate::host::{MemoryContainer, MemoryControl, MemoryEntry, MemoryThread};
use crate::model::{OrderPreference, ViewId};
use crate::store::{MemoryStore, PreferenceStore, DEFAULT_PREFERENCE_KEY};
use crate::sync::ViewSynchronizer;
use futures::executor::block_on;
use std::rc::Rc;

/// Synchronizer type used throughout the tests.
pub type MemorySync = ViewSynchronizer<MemoryContainer, MemoryControl>;

/// Parse a view id.
pub fn view(id: &str) -> ViewId {
    ViewId::new(id).expect("valid view id")
}

/// One thread plus handles to its containers.
pub struct ThreadFixture {
    pub thread: MemoryThread,
    pub entries: MemoryContainer,
    pub control: MemoryControl,
}

impl ThreadFixture {
    /// Thread `id` whose entries carry `ids` in document order.
    pub fn with_ids(id: &str, ids: &[u64]) -> Self {
        Self::with_entries(id, ids.iter().copied().map(MemoryEntry::new).collect())
    }

    /// Thread `id` with explicit entries.
    pub fn with_entries(id: &str, entries: Vec<MemoryEntry>) -> Self {
        let entries = MemoryContainer::new(entries);
        let control = MemoryControl::new();
        let thread = MemoryThread::from_parts(view(id), Some(entries.clone()), Some(control.clone()));
        Self {
            thread,
            entries,
            control,
        }
    }

    /// Selected item of the rendered toggle.
    pub fn shown(&self) -> Option<OrderPreference> {
        self.control.rendered().and_then(|toggle| toggle.selected())
    }
}

/// A store seeded with `preference`, or empty for `None`.
pub fn store_with(preference: Option<OrderPreference>) -> MemoryStore {
    let store = MemoryStore::new();
    match preference {
        Some(preference) => store.with_value(DEFAULT_PREFERENCE_KEY, preference.to_stored()),
        None => store,
    }
}

/// Type-erase a store for the synchronizer.
pub fn shared(store: &MemoryStore) -> Rc<dyn PreferenceStore> {
    Rc::new(store.clone())
}

/// Bind `fixture` against `store` under the default key.
pub fn bind(fixture: &ThreadFixture, store: &MemoryStore) -> MemorySync {
    block_on(ViewSynchronizer::bind_thread(
        &fixture.thread,
        shared(store),
        DEFAULT_PREFERENCE_KEY,
    ))
    .expect("thread binds")
}
