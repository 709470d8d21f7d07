//! Conversions from external infrastructure errors into domain errors.
//!
//! Adapters call [`IntoDomainError::into_domain`] at the port boundary so
//! `reqwest` and `keyring` error types never reach the core crate.

use jobhub_domain::{StorageError, TransportError};
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;

/// Extension trait making the conversion explicit at each call site.
pub trait IntoDomainError<E> {
    fn into_domain(self) -> E;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

// Timeouts are reported by the transport itself, which knows the deadline.
impl IntoDomainError<TransportError> for HttpError {
    fn into_domain(self) -> TransportError {
        if self.is_builder() {
            return TransportError::InvalidRequest(self.to_string());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return TransportError::Network(format!("HTTP body error: {self}"));
        }

        TransportError::Network(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → StorageError */
/* -------------------------------------------------------------------------- */

impl IntoDomainError<StorageError> for KeyringError {
    fn into_domain(self) -> StorageError {
        use KeyringError::{
            Ambiguous, BadEncoding, Invalid, NoEntry, NoStorageAccess, PlatformFailure, TooLong,
        };

        match self {
            NoEntry => StorageError::Corrupt("keychain entry vanished during access".into()),
            BadEncoding(_) => {
                StorageError::Corrupt("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => StorageError::Unavailable(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                StorageError::Unavailable(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => StorageError::Corrupt(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => {
                StorageError::Unavailable(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                StorageError::Unavailable(format!("unable to access secure storage: {err}"))
            }
            other => StorageError::Unavailable(other.to_string()),
        }
    }
}
