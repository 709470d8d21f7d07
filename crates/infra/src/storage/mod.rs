//! Secret storage adapters

pub mod keychain;

use std::sync::Arc;

use jobhub_core::{MemorySecretStorage, SecretStorage};
use jobhub_domain::{StorageBackend, StorageSettings};

pub use keychain::KeychainSecretStorage;

/// Build the storage backend selected in `settings`
pub fn secret_storage(settings: &StorageSettings) -> Arc<dyn SecretStorage> {
    match settings.backend {
        StorageBackend::Keychain => Arc::new(KeychainSecretStorage::new(&settings.service_name)),
        StorageBackend::Memory => Arc::new(MemorySecretStorage::new()),
    }
}
