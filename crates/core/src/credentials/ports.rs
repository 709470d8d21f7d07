//! Port interfaces for credential persistence
//!
//! The credential store talks to durable storage only through this trait so
//! the platform keychain, an in-memory map, or a test double can back it.

use jobhub_domain::StorageError;

/// Durable key/value storage for secrets
///
/// Implementations must be safe to call from any task. `delete` is
/// idempotent.
pub trait SecretStorage: Send + Sync {
    /// Read a value, `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; absent keys are not an error
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
