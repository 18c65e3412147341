//! Persistence boundary for annotation buckets.
//!
//! The engine never talks to a concrete storage backend directly; it goes
//! through [`AnnotationStore`], a small async key-value surface. Backends are
//! expected to be shared across the whole installation, so batched writes and
//! removals exist to keep cleanup down to one round-trip of each kind.

use std::collections::BTreeMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::Result;

/// Async key-value store holding annotation buckets and engine scalars.
///
/// Values are JSON: buckets are arrays of annotation records, scalars (like
/// the last-cleanup timestamp) are plain numbers.
pub trait AnnotationStore: Send + Sync {
    /// Snapshot of every persisted entry.
    fn snapshot(&self) -> BoxFuture<'_, Result<BTreeMap<String, Value>>>;

    /// Read a single entry.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Value>>>;

    /// Write a single entry.
    fn set(&self, key: &str, value: Value) -> BoxFuture<'_, Result<()>>;

    /// Write several entries in one round-trip.
    fn set_many(&self, entries: Vec<(String, Value)>) -> BoxFuture<'_, Result<()>>;

    /// Remove several entries in one round-trip.
    fn remove_many(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>>;
}

/// In-memory store used by tests and as a safe default backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted entries (test helper).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnnotationStore for MemoryStore {
    fn snapshot(&self) -> BoxFuture<'_, Result<BTreeMap<String, Value>>> {
        Box::pin(async move { Ok(self.entries.lock().unwrap().clone()) })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Value>>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.lock().unwrap().get(&key).cloned()) })
    }

    fn set(&self, key: &str, value: Value) -> BoxFuture<'_, Result<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.entries.lock().unwrap().insert(key, value);
            Ok(())
        })
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut guard = self.entries.lock().unwrap();
            for (key, value) in entries {
                guard.insert(key, value);
            }
            Ok(())
        })
    }

    fn remove_many(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut guard = self.entries.lock().unwrap();
            for key in keys {
                guard.remove(&key);
            }
            Ok(())
        })
    }
}
