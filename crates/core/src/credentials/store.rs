//! Per-domain credential store with a typed change channel
//!
//! Persists one access/refresh pair per account domain through a
//! [`SecretStorage`] backend and broadcasts a [`CredentialChange`] on every
//! mutation. Reads always go to the backend; nothing is cached here, so a
//! pair written by a refresh is visible to the very next request.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use jobhub_domain::{AccountDomain, CredentialChange, CredentialPair, StorageError};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::ports::SecretStorage;

/// Durable per-domain credential storage
pub struct CredentialStore {
    storage: Arc<dyn SecretStorage>,
    changes: broadcast::Sender<CredentialChange>,
    // Serializes mutations and counts successful writes per domain.
    revisions: Mutex<HashMap<AccountDomain, u64>>,
}

impl CredentialStore {
    /// Create a store over `storage`
    pub fn new(storage: Arc<dyn SecretStorage>) -> Self {
        let (changes, _) =
            broadcast::channel(jobhub_domain::constants::CREDENTIAL_CHANGE_CAPACITY);
        Self { storage, changes, revisions: Mutex::new(HashMap::new()) }
    }

    /// Current pair for `domain`, `None` when signed out.
    ///
    /// A half-present pair (only one of the two keys) is reported as absent.
    ///
    /// # Errors
    /// Returns the backend error if storage cannot be read
    pub fn get(&self, domain: AccountDomain) -> Result<Option<CredentialPair>, StorageError> {
        let _guard = self.revisions.lock();
        self.read_pair(domain)
    }

    /// Persist `pair` for `domain`, replacing both tokens.
    ///
    /// # Errors
    /// Returns the backend error if the current pair cannot be read or either
    /// write fails. A failed write puts the previous pair back; if that is
    /// impossible the domain is cleared and the sign-out is published.
    pub fn set(&self, domain: AccountDomain, pair: CredentialPair) -> Result<(), StorageError> {
        let profile = domain.profile();
        let mut revisions = self.revisions.lock();
        let previous = self.read_pair(domain)?;

        self.storage.set(profile.access_key, &pair.access_token).inspect_err(|err| {
            warn!(domain = %domain, error = %err, "Failed to persist access token");
        })?;

        if let Err(err) = self.storage.set(profile.refresh_key, &pair.refresh_token) {
            warn!(domain = %domain, error = %err, "Failed to persist refresh token, restoring previous pair");
            let restored = match &previous {
                Some(old) => self.storage.set(profile.access_key, &old.access_token),
                None => self.storage.delete(profile.access_key),
            };
            if let Err(restore_err) = restored {
                warn!(domain = %domain, error = %restore_err, "Restore failed, clearing credentials");
                let _ = self.storage.delete(profile.access_key);
                let _ = self.storage.delete(profile.refresh_key);
                drop(revisions);
                if previous.is_some() {
                    self.publish(domain, previous, None);
                }
            }
            return Err(err);
        }

        *revisions.entry(domain).or_insert(0) += 1;
        drop(revisions);

        debug!(domain = %domain, "Credentials stored");
        self.publish(domain, previous, Some(pair));
        Ok(())
    }

    /// Remove the pair for `domain`.
    ///
    /// # Errors
    /// Returns the backend error if either key cannot be deleted. When only
    /// one delete fails the stored pair is already broken, so the sign-out
    /// is still published.
    pub fn clear(&self, domain: AccountDomain) -> Result<(), StorageError> {
        self.clear_at_revision(domain).1
    }

    /// Clear `domain` and report the revision current while the keys were
    /// removed, so a caller can tell whether a later write superseded it.
    pub(crate) fn clear_at_revision(
        &self,
        domain: AccountDomain,
    ) -> (u64, Result<(), StorageError>) {
        let profile = domain.profile();
        let revisions = self.revisions.lock();
        let revision = revisions.get(&domain).copied().unwrap_or(0);
        let previous = self.read_pair(domain).unwrap_or(None);

        let access = self.storage.delete(profile.access_key);
        let refresh = self.storage.delete(profile.refresh_key);
        drop(revisions);

        let result = match (access, refresh) {
            (Ok(()), Ok(())) => {
                info!(domain = %domain, "Credentials cleared");
                self.publish(domain, previous, None);
                Ok(())
            }
            (Err(err), Err(_)) => Err(err),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => {
                warn!(domain = %domain, error = %err, "Credentials only partially cleared");
                if previous.is_some() {
                    self.publish(domain, previous, None);
                }
                Err(err)
            }
        };
        (revision, result)
    }

    /// Whether a pair is stored for `domain`
    pub fn is_authenticated(&self, domain: AccountDomain) -> bool {
        matches!(self.get(domain), Ok(Some(_)))
    }

    /// Receive every subsequent credential change, for all domains
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialChange> {
        self.changes.subscribe()
    }

    /// Number of successful writes for `domain` since this store was created
    pub fn revision(&self, domain: AccountDomain) -> u64 {
        self.revisions.lock().get(&domain).copied().unwrap_or(0)
    }

    fn read_pair(&self, domain: AccountDomain) -> Result<Option<CredentialPair>, StorageError> {
        let profile = domain.profile();
        let access = self.storage.get(profile.access_key)?;
        let refresh = self.storage.get(profile.refresh_key)?;

        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(Some(CredentialPair::new(access, refresh))),
            (None, None) => Ok(None),
            _ => {
                warn!(domain = %domain, "Incomplete credential pair in storage, treating as signed out");
                Ok(None)
            }
        }
    }

    fn publish(
        &self,
        domain: AccountDomain,
        previous: Option<CredentialPair>,
        next: Option<CredentialPair>,
    ) {
        // No subscribers is fine; the signal is a liveness hint.
        let _ = self.changes.send(CredentialChange { domain, previous, next, at: Utc::now() });
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").field("revisions", &*self.revisions.lock()).finish()
    }
}
