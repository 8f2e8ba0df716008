//! Per-path read offsets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Concurrency-safe map from file path to bytes already delivered.
///
/// Lookups take a shared lock; every mutation takes the exclusive lock.
/// Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct OffsetStore {
    offsets: RwLock<HashMap<PathBuf, u64>>,
}

impl OffsetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored offset for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<u64> {
        self.offsets
            .read()
            .expect("RwLock poisoned")
            .get(path)
            .copied()
    }

    /// Set the offset for a path, creating the entry if needed.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn set(&self, path: &Path, offset: u64) {
        self.offsets
            .write()
            .expect("RwLock poisoned")
            .insert(path.to_path_buf(), offset);
    }

    /// Stop tracking a path. Returns the last offset, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn remove(&self, path: &Path) -> Option<u64> {
        self.offsets.write().expect("RwLock poisoned").remove(path)
    }

    /// Whether the path is tracked.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.offsets
            .read()
            .expect("RwLock poisoned")
            .contains_key(path)
    }

    /// Number of tracked paths.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.read().expect("RwLock poisoned").len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries, sorted by path.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PathBuf, u64)> {
        let mut entries: Vec<_> = self
            .offsets
            .read()
            .expect("RwLock poisoned")
            .iter()
            .map(|(p, o)| (p.clone(), *o))
            .collect();
        entries.sort();
        entries
    }
}
