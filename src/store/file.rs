//! Preference store persisted to a JSON file.
//!
//! The file holds one JSON object mapping keys to values. It is read once
//! on open and rewritten after every successful write. Change
//! notifications reach subscribers in this process only.

use crate::model::StoreError;
use crate::store::{MemoryStore, PreferenceStore, StoreChange};
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::stream::LocalBoxStream;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persist` if the file exists but cannot be read,
    /// `StoreError::Decode` if it is not a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Persist {
                path: path.clone(),
                source,
            })?;
            parse_object(&path, &contents)?
        } else {
            Map::new()
        };
        debug!(path = ?path, keys = values.len(), "Opened preference file");
        Ok(Self {
            path,
            memory: MemoryStore::from_map(values),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Persist {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let contents = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        std::fs::write(&self.path, contents).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })
    }

    /// The file is written first; memory and subscribers only see values
    /// that reached disk.
    fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.memory.peek(key).as_ref() == Some(&value) {
            return Ok(());
        }
        let mut candidate = self.memory.snapshot();
        candidate.insert(key.to_string(), value.clone());
        self.persist(&candidate)?;
        self.memory.write(key, value)?;
        Ok(())
    }
}

fn parse_object(path: &Path, contents: &str) -> Result<Map<String, Value>, StoreError> {
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", kind_name(&other)),
        }),
        Err(e) => Err(StoreError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> LocalBoxFuture<'_, Result<Option<Value>, StoreError>> {
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: Value) -> LocalBoxFuture<'_, Result<(), StoreError>> {
        future::ready(self.write(key, value)).boxed_local()
    }

    fn subscribe(&self, key: &str) -> LocalBoxStream<'static, StoreChange> {
        self.memory.subscribe(key)
    }
}
