//! The seam to the host page.
//!
//! The host application owns every node. These traits describe the small
//! slice of its markup this crate touches:
//! - an entries container whose direct children are the entries,
//! - a control container where the order toggle is rendered,
//! - a page that can enumerate rendered thread views.
//!
//! Handles are cheap to clone and share the underlying node, the way DOM
//! handles do, so mutation goes through `&self`.
//!
//! [`memory`] provides an in-process host used by the CLI and the tests;
//! [`snapshot`] loads one from a JSON document.

use crate::control::ToggleView;
use crate::model::{OrderPreference, ViewId};
use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

pub mod memory;
pub mod snapshot;

pub use memory::{MemoryContainer, MemoryControl, MemoryEntry, MemoryPage, MemoryThread};
pub use snapshot::PageSnapshot;

/// One reorderable entry node.
pub trait Entry: Clone {
    /// Raw value of the entry's identifier attribute, if present.
    fn id_attribute(&self) -> Option<String>;
}

/// Kind of a structural change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Direct children were added or removed.
    ChildList,
    /// An attribute changed. Delivered by some hosts; never acted on.
    Attributes,
}

/// One batch of structural changes on a container.
///
/// Batches are coalesced by the host: a single batch may cover many
/// insertions and removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    /// What changed.
    pub kind: MutationKind,
    /// Nodes added in this batch.
    pub added: usize,
    /// Nodes removed in this batch.
    pub removed: usize,
}

impl MutationBatch {
    /// A child-list batch.
    pub fn child_list(added: usize, removed: usize) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added,
            removed,
        }
    }

    /// True when the batch reports child-list changes.
    pub fn is_child_list(&self) -> bool {
        self.kind == MutationKind::ChildList
    }
}

/// The container whose direct children are the entries of one thread.
pub trait EntryContainer {
    /// Entry handle type.
    type Entry: Entry;

    /// Current children in document order.
    fn children(&self) -> Vec<Self::Entry>;

    /// Current number of children.
    fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Remove every child, then append `ordered` in sequence.
    ///
    /// `ordered` must be a permutation of the current children.
    fn replace_children(&self, ordered: Vec<Self::Entry>);

    /// Subscribe to structural changes of the direct child list.
    ///
    /// The stream ends when the container is discarded by the host.
    fn watch_child_list(&self) -> LocalBoxStream<'static, MutationBatch>;
}

/// Where the order toggle lives.
pub trait ControlSurface {
    /// Replace the toggle's full visual state.
    fn render(&self, view: &ToggleView);

    /// Items the user clicks, as the preference each item stands for.
    fn selections(&self) -> LocalBoxStream<'static, OrderPreference>;
}

/// One rendered thread, before its containers are resolved.
pub trait ThreadHandle {
    /// Entries container handle.
    type Entries: EntryContainer + 'static;
    /// Control container handle.
    type Controls: ControlSurface + 'static;

    /// Stable identifier for this view.
    fn view_id(&self) -> ViewId;

    /// The entries container, if the markup has one.
    fn entries_container(&self) -> Option<Self::Entries>;

    /// The control container, if the markup has one.
    fn control_container(&self) -> Option<Self::Controls>;
}

/// The host page as a whole.
pub trait HostPage {
    /// Thread handle type.
    type Thread: ThreadHandle;

    /// Resolves once the host has finished its current rendering work.
    fn idle(&self) -> LocalBoxFuture<'static, ()>;

    /// Thread views currently shown (hidden or cached views excluded).
    fn thread_views(&self) -> Vec<Self::Thread>;

    /// Whether the view's backing container still exists.
    fn is_attached(&self, view: &ViewId) -> bool;
}
