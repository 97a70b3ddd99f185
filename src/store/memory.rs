//! Shared in-process store.
//!
//! Clones share one map, so handing a clone to each view models the
//! browser's per-extension storage: a write from any view notifies the
//! subscribers of every view.

use crate::model::StoreError;
use crate::store::{PreferenceStore, StoreChange};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::{LocalBoxStream, StreamExt};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Inner {
    values: Map<String, Value>,
    subscribers: HashMap<String, Vec<UnboundedSender<StoreChange>>>,
    failing_reads: usize,
    failing_writes: usize,
    writes: usize,
}

impl Inner {
    fn notify(&mut self, key: &str, change: StoreChange) {
        if let Some(subscribers) = self.subscribers.get_mut(key) {
            subscribers.retain(|tx| tx.unbounded_send(change.clone()).is_ok());
        }
    }
}

/// In-memory preference store with change fan-out.
///
/// Subscribers are only notified when a write changes the stored value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated from a JSON object.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                values,
                ..Inner::default()
            })),
        }
    }

    /// Seed a value without notifying anyone.
    pub fn with_value(self, key: impl Into<String>, value: Value) -> Self {
        self.inner.borrow_mut().values.insert(key.into(), value);
        self
    }

    /// Current value of `key`, bypassing the async API.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Copy of every stored value.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.borrow().values.clone()
    }

    /// Make the next `count` reads fail.
    pub fn fail_next_reads(&self, count: usize) {
        self.inner.borrow_mut().failing_reads = count;
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.inner.borrow_mut().failing_writes = count;
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Synchronous write used by [`PreferenceStore::set`].
    pub(crate) fn write(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_writes > 0 {
            inner.failing_writes -= 1;
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "store rejected the write".to_string(),
            });
        }
        inner.writes += 1;
        let old_value = inner.values.insert(key.to_string(), value.clone());
        if old_value.as_ref() == Some(&value) {
            return Ok(false);
        }
        inner.notify(
            key,
            StoreChange {
                old_value,
                new_value: Some(value),
            },
        );
        Ok(true)
    }

    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_reads > 0 {
            inner.failing_reads -= 1;
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "store rejected the read".to_string(),
            });
        }
        Ok(inner.values.get(key).cloned())
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> LocalBoxFuture<'_, Result<Option<Value>, StoreError>> {
        future::ready(self.read(key)).boxed_local()
    }

    fn set(&self, key: &str, value: Value) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        future::ready(self.write(key, value).map(|_| ())).boxed_local()
    }

    fn subscribe(&self, key: &str) -> LocalBoxStream<'static, StoreChange> {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.borrow_mut();
        let subscribers = inner.subscribers.entry(key.to_string()).or_default();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.push(tx);
        rx.boxed_local()
    }
}
