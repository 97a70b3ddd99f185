//! JSON page snapshots.
//!
//! A snapshot describes the thread views of a page so the CLI can run the
//! synchronizer against them:
//!
//! ```json
//! {"threads": [{"id": "ticket-1", "has_controls": true,
//!               "entries": [{"id": "3"}, {"id": "1"}, {"id": null}]}]}
//! ```
//!
//! A thread without `entries` has no entries container. `cached` threads
//! exist on the page but are not reported as shown.

use crate::host::memory::{MemoryContainer, MemoryControl, MemoryEntry, MemoryPage, MemoryThread};
use crate::model::{SnapshotError, ViewId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A page as described in a snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSnapshot {
    /// Thread views in render order.
    #[serde(default)]
    pub threads: Vec<ThreadSnapshot>,
}

/// One thread view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadSnapshot {
    /// View id, unique on the page.
    pub id: String,
    /// Kept hidden by the host.
    #[serde(default)]
    pub cached: bool,
    /// Whether the control container is present.
    #[serde(default = "default_has_controls")]
    pub has_controls: bool,
    /// Entries in document order; absent means no entries container.
    #[serde(default)]
    pub entries: Option<Vec<EntrySnapshot>>,
}

fn default_has_controls() -> bool {
    true
}

/// One entry node. The id is kept raw so malformed ids survive loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrySnapshot {
    /// Raw id attribute.
    #[serde(default)]
    pub id: Option<String>,
    /// Optional label; defaults to the id.
    #[serde(default)]
    pub label: Option<String>,
}

impl PageSnapshot {
    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// `SnapshotError::Read` if the file cannot be read,
    /// `SnapshotError::Parse` if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|error| SnapshotError::Parse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Build the in-memory page this snapshot describes.
    ///
    /// # Errors
    ///
    /// `SnapshotError::EmptyThreadId` for a thread with a blank id.
    pub fn into_page(self) -> Result<MemoryPage, SnapshotError> {
        let page = MemoryPage::new();
        for (index, thread) in self.threads.into_iter().enumerate() {
            let id = ViewId::new(thread.id).map_err(|_| SnapshotError::EmptyThreadId { index })?;
            let entries = thread.entries.map(|entries| {
                MemoryContainer::new(
                    entries
                        .into_iter()
                        .map(|entry| {
                            let label = entry
                                .label
                                .or_else(|| entry.id.clone())
                                .unwrap_or_default();
                            MemoryEntry::with_raw_id(entry.id.as_deref(), label)
                        })
                        .collect(),
                )
            });
            let controls = thread.has_controls.then(MemoryControl::new);
            let handle = MemoryThread::from_parts(id, entries, controls);
            if thread.cached {
                page.add_cached_thread(handle);
            } else {
                page.add_thread(handle);
            }
        }
        Ok(page)
    }
}
