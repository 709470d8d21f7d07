//! Platform keychain secret storage
//!
//! Thin wrapper over the platform keychain (macOS Keychain Access, Windows
//! Credential Manager, Linux Secret Service) keyed by a fixed service name.
//! Each credential key becomes one keychain account under that service.

use jobhub_core::SecretStorage;
use jobhub_domain::StorageError;
use keyring::Entry;
use tracing::debug;

use crate::errors::IntoDomainError;

/// [`SecretStorage`] backed by the platform keychain
#[derive(Debug, Clone)]
pub struct KeychainSecretStorage {
    service_name: String,
}

impl KeychainSecretStorage {
    /// Create a storage for `service_name` (e.g. "jobhub.session")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service_name, key).map_err(IntoDomainError::into_domain)
    }
}

impl SecretStorage for KeychainSecretStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!(service = %self.service_name, key = %key, "Reading secret from keychain");

        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into_domain()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        self.entry(key)?.set_password(value).map_err(IntoDomainError::into_domain)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into_domain()),
        }
    }
}
