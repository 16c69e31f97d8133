//! Keyed snapshot storage.
//!
//! A backend stores opaque blobs under string keys. The wizard uses a single
//! key per draft; backends do not interpret the bytes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::PersistError;

/// Storage backend for persisted drafts.
pub trait SnapshotStorage: Send + Sync {
    /// Returns the blob stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;

    /// Replaces the blob stored under `key`.
    fn store(&self, key: &str, blob: &[u8]) -> Result<(), PersistError>;

    /// Removes the blob under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        (**self).store(key, blob)
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        (**self).remove(key)
    }
}

fn lock_err(context: &'static str) -> PersistError {
    PersistError::storage(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `store` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    /// Number of keys currently held.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, PersistError> {
        let blobs = self.blobs.read().map_err(|_| lock_err("memory storage"))?;
        Ok(blobs.len())
    }

    /// True when no keys are held.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, PersistError> {
        Ok(self.len()? == 0)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        let blobs = self.blobs.read().map_err(|_| lock_err("memory storage"))?;
        Ok(blobs.get(key).cloned())
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        let mut blobs = self.blobs.write().map_err(|_| lock_err("memory storage"))?;
        blobs.insert(key.to_string(), blob.to_vec());
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let mut blobs = self.blobs.write().map_err(|_| lock_err("memory storage"))?;
        blobs.remove(key);
        Ok(())
    }
}
