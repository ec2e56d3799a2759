use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{CajaError, Result};

use super::{StateStore, StorageKey};

/// Process-local store, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CajaError {
    CajaError::Storage("memory storage lock poisoned".into())
}

impl StateStore for MemoryStorage {
    fn read_raw(&self, key: StorageKey) -> Result<Option<String>> {
        let guard = self.documents.read().map_err(|_| poisoned())?;
        Ok(guard.get(&key).cloned())
    }

    fn write_raw(&self, key: StorageKey, data: &str) -> Result<()> {
        let mut guard = self.documents.write().map_err(|_| poisoned())?;
        guard.insert(key, data.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut guard = self.documents.write().map_err(|_| poisoned())?;
        guard.remove(&key);
        Ok(())
    }
}
