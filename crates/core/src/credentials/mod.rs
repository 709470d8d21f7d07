//! Credential persistence
//!
//! [`CredentialStore`] keeps one access/refresh pair per account domain on
//! top of a [`SecretStorage`] backend and publishes a typed change event on
//! every mutation.

mod memory;
mod ports;
mod store;

pub use memory::MemorySecretStorage;
pub use ports::SecretStorage;
pub use store::CredentialStore;
