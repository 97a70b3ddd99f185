//! Domain types (pure).

pub mod error;
pub mod identifiers;
pub mod malformed_entry;
pub mod preference;

pub use error::{AppError, ContainerKind, SnapshotError, StoreError, SyncError};
pub use identifiers::{EntryId, InvalidEntryId, InvalidViewId, ViewId};
pub use malformed_entry::{MalformedEntry, MalformedReason};
pub use preference::{OrderPreference, UnknownPreference};
