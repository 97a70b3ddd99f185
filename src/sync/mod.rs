//! Per-view synchronization state machine.
//!
//! A [`ViewSynchronizer`] keeps one thread view's entries in the order the
//! shared preference asks for. Three sources can change the rendered list:
//! the host re-rendering entries, a preference change written from any view,
//! and this synchronizer's own reorders. Only the first two may trigger a
//! reorder.
//!
//! Self-caused changes are recognized by child count: a reorder is a
//! permutation, so the count it leaves behind equals the count recorded
//! before it ran. A child-list notification that finds the count unchanged
//! is ignored. A host change that happens to leave the count unchanged is
//! ignored too; that is a known limitation of the count check.
//!
//! ```text
//! Unbound --bind--> Bound(observed_count) --container discarded--> (done)
//! ```

use crate::control::{self, ControlBinding};
use crate::host::{ControlSurface, EntryContainer, MutationBatch, ThreadHandle};
use crate::model::{ContainerKind, MalformedEntry, OrderPreference, SyncError, ViewId};
use crate::ordering;
use crate::store::{self, PreferenceStore, StoreChange};
use futures::stream::{self, LocalBoxStream, StreamExt};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Lifecycle of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Containers resolved, nothing ordered or watched yet.
    Unbound,
    /// Ordered and watching.
    Bound {
        /// Child count as last reconciled.
        observed_count: usize,
    },
}

/// What a notification led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Nothing to do: a self-caused or non-structural change, or the view
    /// is not bound.
    Ignored,
    /// Entries were re-materialized in the target order.
    Reordered {
        /// Preference applied.
        preference: OrderPreference,
        /// Child count after the reorder.
        count: usize,
    },
    /// An entry had no usable id; the container was left untouched.
    Skipped {
        /// Preference that could not be applied.
        preference: OrderPreference,
        /// The offending entry.
        malformed: MalformedEntry,
    },
}

/// An event on a watched view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A structural change batch from the entries container.
    ChildList(MutationBatch),
    /// The stored preference changed.
    Preference(StoreChange),
    /// The user clicked a toggle item.
    Selected(OrderPreference),
    /// The entries container was discarded.
    Detached,
}

/// Keeps one thread view ordered.
pub struct ViewSynchronizer<C, S> {
    view_id: ViewId,
    entries: C,
    control: ControlBinding<S>,
    store: Rc<dyn PreferenceStore>,
    key: String,
    state: SyncState,
    preference: OrderPreference,
    generation: u64,
    last_reaction: Reaction,
}

impl<C, S> std::fmt::Debug for ViewSynchronizer<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSynchronizer")
            .field("view_id", &self.view_id)
            .field("key", &self.key)
            .field("state", &self.state)
            .field("preference", &self.preference)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<C, S> ViewSynchronizer<C, S>
where
    C: EntryContainer + 'static,
    S: ControlSurface + 'static,
{
    /// Resolve a thread's containers. The result is [`SyncState::Unbound`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ContainerNotFound` if either container is
    /// missing.
    pub fn attach<T>(thread: &T, store: Rc<dyn PreferenceStore>, key: impl Into<String>) -> Result<Self, SyncError>
    where
        T: ThreadHandle<Entries = C, Controls = S>,
    {
        let view_id = thread.view_id();
        let entries = thread
            .entries_container()
            .ok_or_else(|| SyncError::ContainerNotFound {
                view: view_id.clone(),
                container: ContainerKind::Entries,
            })?;
        let controls = thread
            .control_container()
            .ok_or_else(|| SyncError::ContainerNotFound {
                view: view_id.clone(),
                container: ContainerKind::Controls,
            })?;
        Ok(Self {
            view_id,
            entries,
            control: ControlBinding::new(controls),
            store,
            key: key.into(),
            state: SyncState::Unbound,
            preference: OrderPreference::Default,
            generation: 0,
            last_reaction: Reaction::Ignored,
        })
    }

    /// Resolve containers and bind in one step.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ContainerNotFound` if either container is
    /// missing; the view stays unbound.
    pub async fn bind_thread<T>(thread: &T, store: Rc<dyn PreferenceStore>, key: impl Into<String>) -> Result<Self, SyncError>
    where
        T: ThreadHandle<Entries = C, Controls = S>,
    {
        let mut sync = Self::attach(thread, store, key)?;
        sync.bind().await;
        Ok(sync)
    }

    /// Bind: read the preference, order the entries, record the child
    /// count, render the toggle.
    ///
    /// A failed read degrades to `Default` rather than failing the view. A
    /// malformed entry skips the reorder but the view is still bound.
    pub async fn bind(&mut self) -> &Reaction {
        let store = Rc::clone(&self.store);
        let preference = match store::read_preference(store.as_ref(), &self.key).await {
            Ok(preference) => preference,
            Err(error) => {
                warn!(view = %self.view_id, error = %error, "Could not read order preference, using default");
                OrderPreference::Default
            }
        };
        self.state = SyncState::Bound {
            observed_count: self.entries.child_count(),
        };
        self.apply(preference);
        info!(
            view = %self.view_id,
            preference = %preference,
            count = self.observed_count().unwrap_or_default(),
            "Bound thread view"
        );
        &self.last_reaction
    }

    /// Handle a structural change batch on the entries container.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StoreAccess` if re-reading the preference fails;
    /// the observed count is already updated and the order is left as is.
    pub async fn on_child_list_changed(&mut self, batch: &MutationBatch) -> Result<Reaction, SyncError> {
        if !batch.is_child_list() {
            return Ok(Reaction::Ignored);
        }
        let SyncState::Bound { observed_count } = self.state else {
            return Ok(Reaction::Ignored);
        };
        let current = self.entries.child_count();
        if current == observed_count {
            debug!(view = %self.view_id, count = current, "Child list unchanged in size, ignoring");
            return Ok(Reaction::Ignored);
        }

        info!(view = %self.view_id, from = observed_count, to = current, "Host changed entries");
        self.state = SyncState::Bound {
            observed_count: current,
        };
        let store = Rc::clone(&self.store);
        let preference = store::read_preference(store.as_ref(), &self.key).await?;
        Ok(self.apply(preference))
    }

    /// Handle a change of the stored preference, from this view or any
    /// other.
    pub fn on_preference_changed(&mut self, change: &StoreChange) -> Reaction {
        if self.state == SyncState::Unbound {
            return Reaction::Ignored;
        }
        let preference = store::decode(&self.key, change.new_value.as_ref());
        debug!(view = %self.view_id, preference = %preference, "Order preference changed");
        self.apply(preference)
    }

    /// Order, materialize, record the count, refresh the toggle.
    fn apply(&mut self, preference: OrderPreference) -> Reaction {
        self.preference = preference;
        let reaction = match self.materialize(preference) {
            Ok(count) => Reaction::Reordered { preference, count },
            Err(malformed) => {
                warn!(view = %self.view_id, error = %malformed, "Skipping reorder of malformed thread");
                Reaction::Skipped {
                    preference,
                    malformed,
                }
            }
        };
        self.state = SyncState::Bound {
            observed_count: self.entries.child_count(),
        };
        self.control.refresh(preference);
        self.last_reaction = reaction.clone();
        reaction
    }

    /// Remove every entry and re-append in target order.
    fn materialize(&mut self, preference: OrderPreference) -> Result<usize, MalformedEntry> {
        let current = self.entries.children();
        let before = current.len();
        let target = ordering::order(&current, preference)?;
        self.entries.replace_children(target);
        self.generation += 1;

        let after = self.entries.child_count();
        debug_assert_eq!(before, after, "a reorder must be a permutation");
        Ok(after)
    }

    /// Subscribe to everything this view reacts to.
    ///
    /// Subscriptions are taken when this is called, so call it right after
    /// binding. The stream yields [`ViewEvent::Detached`] once the entries
    /// container's change stream ends; [`ViewSynchronizer::run`] stops there.
    pub fn subscribe(&self) -> LocalBoxStream<'static, ViewEvent> {
        let child_list = self
            .entries
            .watch_child_list()
            .map(ViewEvent::ChildList)
            .chain(stream::once(async { ViewEvent::Detached }));
        let preferences = self.store.subscribe(&self.key).map(ViewEvent::Preference);
        let selections = self.control.selections().map(ViewEvent::Selected);

        stream::select_all([
            child_list.boxed_local(),
            preferences.boxed_local(),
            selections.boxed_local(),
        ])
        .boxed_local()
    }

    /// Handle one event. Selections are written through `spawner` without
    /// waiting for the result.
    pub async fn handle(&mut self, event: ViewEvent, spawner: &impl LocalSpawn) -> Reaction {
        match event {
            ViewEvent::ChildList(batch) => match self.on_child_list_changed(&batch).await {
                Ok(reaction) => reaction,
                Err(error) => {
                    warn!(view = %self.view_id, error = %error, "Could not reconcile host change");
                    Reaction::Ignored
                }
            },
            ViewEvent::Preference(change) => self.on_preference_changed(&change),
            ViewEvent::Selected(preference) => {
                let write = control::select(Rc::clone(&self.store), self.key.clone(), preference);
                if let Err(error) = spawner.spawn_local(async move {
                    write.await;
                }) {
                    warn!(view = %self.view_id, error = %error, "Could not schedule preference write");
                }
                Reaction::Ignored
            }
            ViewEvent::Detached => Reaction::Ignored,
        }
    }

    /// Process `events` until the view is detached, then hand the
    /// synchronizer back.
    pub async fn run(mut self, mut events: LocalBoxStream<'static, ViewEvent>, spawner: impl LocalSpawn) -> Self {
        while let Some(event) = events.next().await {
            if event == ViewEvent::Detached {
                break;
            }
            self.handle(event, &spawner).await;
        }
        info!(view = %self.view_id, reorders = self.generation, "Thread view discarded, watch ended");
        self
    }

    /// This view's id.
    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Observed child count while bound.
    pub fn observed_count(&self) -> Option<usize> {
        match self.state {
            SyncState::Bound { observed_count } => Some(observed_count),
            SyncState::Unbound => None,
        }
    }

    /// Preference most recently applied.
    pub fn preference(&self) -> OrderPreference {
        self.preference
    }

    /// Number of reorders performed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Outcome of the most recent reorder attempt.
    pub fn last_reaction(&self) -> &Reaction {
        &self.last_reaction
    }

    /// The entries container.
    pub fn entries(&self) -> &C {
        &self.entries
    }

    /// The toggle binding.
    pub fn control(&self) -> &ControlBinding<S> {
        &self.control
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
