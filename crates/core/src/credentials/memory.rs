//! In-memory secret storage
//!
//! Backs ephemeral sessions (credentials are lost on restart) and tests.

use std::collections::HashMap;

use jobhub_domain::StorageError;
use parking_lot::Mutex;

use super::ports::SecretStorage;

/// `SecretStorage` backed by a process-local map
#[derive(Debug, Default)]
pub struct MemorySecretStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl SecretStorage for MemorySecretStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
