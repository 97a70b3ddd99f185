//! Preference store access.
//!
//! The store is an asynchronous key-value map shared by every view of the
//! page, with change notifications for each key. Every operation returns
//! an explicit `Result`; failures are never folded into "missing".

use crate::model::{OrderPreference, StoreError};
use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use serde_json::Value;
use tracing::warn;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key the order preference is stored under unless configured otherwise.
pub const DEFAULT_PREFERENCE_KEY: &str = "reversed_order";

/// A change to one key, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    /// Value before the write (`None` if absent).
    pub old_value: Option<Value>,
    /// Value after the write (`None` if removed).
    pub new_value: Option<Value>,
}

/// Asynchronous key-value store with per-key change subscriptions.
///
/// Shared by all views; there is no locking and the last write wins.
pub trait PreferenceStore {
    /// Read a key. `Ok(None)` when absent.
    fn get(&self, key: &str) -> LocalBoxFuture<'_, Result<Option<Value>, StoreError>>;

    /// Write a key.
    fn set(&self, key: &str, value: Value) -> LocalBoxFuture<'_, Result<(), StoreError>>;

    /// Changes to `key`, whichever view or context wrote them.
    fn subscribe(&self, key: &str) -> LocalBoxStream<'static, StoreChange>;
}

/// Read the order preference. An absent key is `Default`.
pub async fn read_preference(
    store: &dyn PreferenceStore,
    key: &str,
) -> Result<OrderPreference, StoreError> {
    let value = store.get(key).await?;
    Ok(decode(key, value.as_ref()))
}

/// Write the order preference.
pub async fn write_preference(
    store: &dyn PreferenceStore,
    key: &str,
    preference: OrderPreference,
) -> Result<(), StoreError> {
    store.set(key, preference.to_stored()).await
}

/// Decode a stored value, warning about shapes this crate never writes.
pub fn decode(key: &str, value: Option<&Value>) -> OrderPreference {
    if !OrderPreference::is_recognized(value) {
        warn!(key = %key, value = ?value, "Unrecognized order preference value, using default");
    }
    OrderPreference::from_stored(value)
}
