//! In-process host page.
//!
//! Models the parts of a rendered page the synchronizer sees: entry nodes
//! with an id attribute, containers that report child-list changes in
//! batches, and a control surface that records what was rendered and lets
//! callers simulate clicks.
//!
//! Handles share state through `Rc<RefCell<..>>`, so a test can keep a
//! clone of a container and mutate it as the host would while a
//! synchronizer holds another clone.

use crate::control::ToggleView;
use crate::host::{ControlSurface, Entry, EntryContainer, HostPage, MutationBatch, ThreadHandle};
use crate::model::{OrderPreference, ViewId};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::{LocalBoxStream, StreamExt};
use std::cell::RefCell;
use std::rc::Rc;

/// An entry node with an optional id attribute and a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    id: Option<String>,
    label: String,
}

impl MemoryEntry {
    /// Entry with a numeric id; the label defaults to the id.
    pub fn new(id: u64) -> Self {
        Self {
            id: Some(id.to_string()),
            label: id.to_string(),
        }
    }

    /// Entry with a raw (possibly missing or malformed) id attribute.
    pub fn with_raw_id(id: Option<&str>, label: impl Into<String>) -> Self {
        Self {
            id: id.map(str::to_string),
            label: label.into(),
        }
    }

    /// Replace the label, keeping the id.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Label used to tell entries with equal ids apart.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Entry for MemoryEntry {
    fn id_attribute(&self) -> Option<String> {
        self.id.clone()
    }
}

#[derive(Debug, Default)]
struct ContainerState {
    children: Vec<MemoryEntry>,
    watchers: Vec<UnboundedSender<MutationBatch>>,
    replacements: usize,
    disposed: bool,
}

impl ContainerState {
    fn notify(&mut self, batch: MutationBatch) {
        self.watchers
            .retain(|watcher| watcher.unbounded_send(batch.clone()).is_ok());
    }
}

/// A container of entries that reports child-list changes.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl MemoryContainer {
    /// Container holding `entries` in document order.
    pub fn new(entries: Vec<MemoryEntry>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContainerState {
                children: entries,
                ..ContainerState::default()
            })),
        }
    }

    /// Container holding entries with the given ids, in that order.
    pub fn with_ids(ids: &[u64]) -> Self {
        Self::new(ids.iter().copied().map(MemoryEntry::new).collect())
    }

    /// Host-side append, as when new data arrives.
    pub fn push(&self, entry: MemoryEntry) {
        let mut state = self.state.borrow_mut();
        state.children.push(entry);
        state.notify(MutationBatch::child_list(1, 0));
    }

    /// Host-side removal of the child at `index`, if any.
    pub fn remove(&self, index: usize) -> Option<MemoryEntry> {
        let mut state = self.state.borrow_mut();
        if index >= state.children.len() {
            return None;
        }
        let removed = state.children.remove(index);
        state.notify(MutationBatch::child_list(0, 1));
        Some(removed)
    }

    /// Host-side re-render that swaps one child for another in place.
    ///
    /// Reported as a child-list batch even though the count is unchanged.
    pub fn swap_child(&self, index: usize, entry: MemoryEntry) -> Option<MemoryEntry> {
        let mut state = self.state.borrow_mut();
        let slot = state.children.get_mut(index)?;
        let old = std::mem::replace(slot, entry);
        state.notify(MutationBatch::child_list(1, 1));
        Some(old)
    }

    /// Discard the container: pending and future watchers see their
    /// streams end.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        state.disposed = true;
        state.watchers.clear();
    }

    /// Whether [`MemoryContainer::dispose`] was called.
    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Raw id attributes of the children in document order.
    pub fn raw_ids(&self) -> Vec<Option<String>> {
        self.state
            .borrow()
            .children
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Numeric ids of the children, skipping entries without one.
    pub fn ids(&self) -> Vec<u64> {
        self.raw_ids()
            .into_iter()
            .filter_map(|raw| raw.and_then(|id| id.trim().parse().ok()))
            .collect()
    }

    /// Labels of the children in document order.
    pub fn labels(&self) -> Vec<String> {
        self.state
            .borrow()
            .children
            .iter()
            .map(|entry| entry.label.clone())
            .collect()
    }

    /// How many times the children were replaced wholesale.
    pub fn replacements(&self) -> usize {
        self.state.borrow().replacements
    }
}

impl EntryContainer for MemoryContainer {
    type Entry = MemoryEntry;

    fn children(&self) -> Vec<MemoryEntry> {
        self.state.borrow().children.clone()
    }

    fn child_count(&self) -> usize {
        self.state.borrow().children.len()
    }

    fn replace_children(&self, ordered: Vec<MemoryEntry>) {
        let mut state = self.state.borrow_mut();
        let removed = std::mem::replace(&mut state.children, ordered).len();
        let added = state.children.len();
        state.replacements += 1;
        state.notify(MutationBatch::child_list(added, removed));
    }

    fn watch_child_list(&self) -> LocalBoxStream<'static, MutationBatch> {
        let mut state = self.state.borrow_mut();
        let (tx, rx) = mpsc::unbounded();
        state.watchers.retain(|watcher| !watcher.is_closed());
        if !state.disposed {
            state.watchers.push(tx);
        }
        rx.boxed_local()
    }
}

#[derive(Debug, Default)]
struct ControlState {
    rendered: Option<ToggleView>,
    renders: usize,
    listeners: Vec<UnboundedSender<OrderPreference>>,
}

/// A control container that records the rendered toggle.
#[derive(Debug, Clone, Default)]
pub struct MemoryControl {
    state: Rc<RefCell<ControlState>>,
}

impl MemoryControl {
    /// Empty control container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The toggle as last rendered.
    pub fn rendered(&self) -> Option<ToggleView> {
        self.state.borrow().rendered.clone()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.state.borrow().renders
    }

    /// Simulate the user clicking the item for `preference`.
    pub fn click(&self, preference: OrderPreference) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|listener| listener.unbounded_send(preference).is_ok());
    }
}

impl ControlSurface for MemoryControl {
    fn render(&self, view: &ToggleView) {
        let mut state = self.state.borrow_mut();
        state.rendered = Some(view.clone());
        state.renders += 1;
    }

    fn selections(&self) -> LocalBoxStream<'static, OrderPreference> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.state.borrow_mut();
        state.listeners.retain(|listener| !listener.is_closed());
        state.listeners.push(tx);
        rx.boxed_local()
    }
}

/// One thread view of the in-memory page.
#[derive(Debug, Clone)]
pub struct MemoryThread {
    id: ViewId,
    entries: Option<MemoryContainer>,
    controls: Option<MemoryControl>,
}

impl MemoryThread {
    /// Thread with both containers present.
    pub fn new(id: ViewId, entries: MemoryContainer) -> Self {
        Self {
            id,
            entries: Some(entries),
            controls: Some(MemoryControl::new()),
        }
    }

    /// Thread with explicit (possibly missing) containers.
    pub fn from_parts(
        id: ViewId,
        entries: Option<MemoryContainer>,
        controls: Option<MemoryControl>,
    ) -> Self {
        Self {
            id,
            entries,
            controls,
        }
    }

    /// The entries container, if present.
    pub fn entries(&self) -> Option<&MemoryContainer> {
        self.entries.as_ref()
    }

    /// The control container, if present.
    pub fn controls(&self) -> Option<&MemoryControl> {
        self.controls.as_ref()
    }
}

impl ThreadHandle for MemoryThread {
    type Entries = MemoryContainer;
    type Controls = MemoryControl;

    fn view_id(&self) -> ViewId {
        self.id.clone()
    }

    fn entries_container(&self) -> Option<MemoryContainer> {
        self.entries.clone()
    }

    fn control_container(&self) -> Option<MemoryControl> {
        self.controls.clone()
    }
}

#[derive(Debug, Default)]
struct PageState {
    threads: Vec<(MemoryThread, bool)>,
}

/// An in-memory page of thread views.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    state: Rc<RefCell<PageState>>,
}

impl MemoryPage {
    /// Empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a thread view.
    pub fn add_thread(&self, thread: MemoryThread) {
        self.state.borrow_mut().threads.push((thread, false));
    }

    /// Render a thread view that the host keeps cached and hidden.
    pub fn add_cached_thread(&self, thread: MemoryThread) {
        self.state.borrow_mut().threads.push((thread, true));
    }

    /// Show or hide a thread.
    pub fn set_cached(&self, id: &ViewId, cached: bool) {
        let mut state = self.state.borrow_mut();
        if let Some((_, flag)) = state.threads.iter_mut().find(|(t, _)| &t.id == id) {
            *flag = cached;
        }
    }

    /// Discard a thread's subtree. Its container is disposed.
    pub fn remove_thread(&self, id: &ViewId) -> Option<MemoryThread> {
        let mut state = self.state.borrow_mut();
        let index = state.threads.iter().position(|(t, _)| &t.id == id)?;
        let (thread, _) = state.threads.remove(index);
        if let Some(entries) = &thread.entries {
            entries.dispose();
        }
        Some(thread)
    }

    /// Look up a thread, shown or cached.
    pub fn thread(&self, id: &ViewId) -> Option<MemoryThread> {
        self.state
            .borrow()
            .threads
            .iter()
            .find(|(t, _)| &t.id == id)
            .map(|(t, _)| t.clone())
    }

    /// Every thread, shown or cached, in render order.
    pub fn all_threads(&self) -> Vec<MemoryThread> {
        self.state
            .borrow()
            .threads
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }
}

impl HostPage for MemoryPage {
    type Thread = MemoryThread;

    fn idle(&self) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }

    fn thread_views(&self) -> Vec<MemoryThread> {
        self.state
            .borrow()
            .threads
            .iter()
            .filter(|(_, cached)| !cached)
            .map(|(t, _)| t.clone())
            .collect()
    }

    fn is_attached(&self, view: &ViewId) -> bool {
        self.state.borrow().threads.iter().any(|(t, _)| &t.id == view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn view(id: &str) -> ViewId {
        ViewId::new(id).unwrap()
    }

    #[test]
    fn push_notifies_watchers_with_child_list_batch() {
        let container = MemoryContainer::with_ids(&[1, 2]);
        let mut changes = container.watch_child_list();
        container.push(MemoryEntry::new(3));

        let batch = block_on(changes.next()).expect("batch delivered");
        assert_eq!(batch, MutationBatch::child_list(1, 0));
        assert_eq!(container.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn replace_children_is_one_batch() {
        let container = MemoryContainer::with_ids(&[3, 1, 2]);
        let mut changes = container.watch_child_list();
        container.replace_children(vec![MemoryEntry::new(1), MemoryEntry::new(2), MemoryEntry::new(3)]);

        let batch = block_on(changes.next()).expect("batch delivered");
        assert_eq!(batch, MutationBatch::child_list(3, 3));
        assert_eq!(container.replacements(), 1);
        assert_eq!(container.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn dispose_ends_watch_streams() {
        let container = MemoryContainer::with_ids(&[1]);
        let mut changes = container.watch_child_list();
        container.dispose();
        assert_eq!(block_on(changes.next()), None);

        let mut late = container.watch_child_list();
        assert_eq!(block_on(late.next()), None, "disposed containers cannot be watched");
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let container = MemoryContainer::with_ids(&[1]);
        assert!(container.remove(5).is_none());
        assert_eq!(container.remove(0), Some(MemoryEntry::new(1)));
        assert_eq!(container.child_count(), 0);
    }

    #[test]
    fn click_reaches_selection_listeners() {
        let control = MemoryControl::new();
        let mut clicks = control.selections();
        control.click(OrderPreference::Reversed);
        assert_eq!(block_on(clicks.next()), Some(OrderPreference::Reversed));
    }

    #[test]
    fn dropped_listeners_are_pruned_on_subscribe() {
        let control = MemoryControl::new();
        drop(control.selections());
        drop(control.selections());
        let _live = control.selections();
        assert_eq!(control.state.borrow().listeners.len(), 1);

        let container = MemoryContainer::with_ids(&[1]);
        drop(container.watch_child_list());
        let _watch = container.watch_child_list();
        assert_eq!(container.state.borrow().watchers.len(), 1);
    }

    #[test]
    fn cached_threads_are_not_reported() {
        let page = MemoryPage::new();
        page.add_thread(MemoryThread::new(view("a"), MemoryContainer::default()));
        page.add_cached_thread(MemoryThread::new(view("b"), MemoryContainer::default()));

        let shown: Vec<_> = page.thread_views().iter().map(|t| t.view_id()).collect();
        assert_eq!(shown, vec![view("a")]);
        assert!(page.is_attached(&view("b")), "cached threads still exist");

        page.set_cached(&view("b"), false);
        assert_eq!(page.thread_views().len(), 2);
    }

    #[test]
    fn removing_thread_detaches_and_disposes() {
        let page = MemoryPage::new();
        let container = MemoryContainer::with_ids(&[1]);
        page.add_thread(MemoryThread::new(view("a"), container.clone()));

        assert!(page.remove_thread(&view("a")).is_some());
        assert!(!page.is_attached(&view("a")));
        assert!(container.is_disposed());
    }
}
