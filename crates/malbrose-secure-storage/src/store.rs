//! Generic credential store backends.
//!
//! Defines the [`CredentialStore`] trait and provides
//! [`MemoryCredentialStore`], a process-local implementation used by tests
//! and headless runs. The OS-backed stores live in [`crate::backend`].

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::credential::{validate_key, Credential};
use crate::error::{Result, StorageError};

/// A keyed store holding at most one credential per key.
pub trait CredentialStore: Send + Sync {
    /// Create or replace the credential under `credential.key`.
    fn store(&self, credential: &Credential) -> Result<()>;

    /// Look up a credential. `Ok(None)` means no entry exists.
    fn load(&self, key: &str) -> Result<Option<Credential>>;

    /// Remove a credential. Removing an absent key is [`StorageError::NotFound`].
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, Credential>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("credential map lock poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn store(&self, credential: &Credential) -> Result<()> {
        validate_key(&credential.key)?;
        debug!(key = %credential.key, "storing credential in memory");
        self.with_entries(|entries| {
            entries.insert(credential.key.clone(), credential.clone());
        })
    }

    fn load(&self, key: &str) -> Result<Option<Credential>> {
        validate_key(key)?;
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match self.with_entries(|entries| entries.remove(key))? {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}
