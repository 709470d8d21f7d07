//! Session runtime
//!
//! Wires one shared [`CredentialStore`], one transport and one navigator into
//! the two authenticated dispatchers plus the public dispatcher. Both account
//! domains share the store and transport but own separate refresh
//! coordinators.

use std::sync::Arc;

use jobhub_core::{
    CredentialStore, PublicClient, SecretStorage, SessionClient, SessionNavigator, Transport,
};
use jobhub_domain::{AccountDomain, ApiError, Config, CredentialChange, SessionEvent};
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::http::ReqwestTransport;
use crate::navigator::ChannelNavigator;
use crate::storage::secret_storage;

/// Fully wired session layer for one process
pub struct SessionRuntime {
    store: Arc<CredentialStore>,
    user: SessionClient,
    employer: SessionClient,
    public: PublicClient,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl SessionRuntime {
    /// Build the runtime from configuration with the default adapters:
    /// reqwest transport, the configured secret storage and a channel
    /// navigator.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::builder()
            .user_agent(concat!("jobhub-session/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_parts(config, secret_storage(&config.storage), Arc::new(transport))
    }

    /// Build the runtime around caller-supplied storage and transport
    pub fn with_parts(
        config: &Config,
        storage: Arc<dyn SecretStorage>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let (navigator, events) = ChannelNavigator::new();
        let navigator: Arc<dyn SessionNavigator> = Arc::new(navigator);
        let store = Arc::new(CredentialStore::new(storage));

        let build = |domain: AccountDomain| {
            SessionClient::builder(domain)
                .base_url(&config.api.base_url)
                .store(store.clone())
                .transport(transport.clone())
                .navigator(navigator.clone())
                .request_timeout(config.api.request_timeout())
                .refresh_timeout(config.api.refresh_timeout())
                .build()
        };
        let user = build(AccountDomain::User)?;
        let employer = build(AccountDomain::Employer)?;

        let public = PublicClient::new(&config.api.base_url, transport.clone())?
            .with_request_timeout(config.api.request_timeout());

        info!(
            base_url = %config.api.base_url,
            backend = ?config.storage.backend,
            "Session runtime ready"
        );

        Ok(Self { store, user, employer, public, events: Some(events) })
    }

    /// Authenticated dispatcher for `domain`
    pub fn client(&self, domain: AccountDomain) -> &SessionClient {
        match domain {
            AccountDomain::User => &self.user,
            AccountDomain::Employer => &self.employer,
        }
    }

    /// Dispatcher for endpoints that never carry credentials
    pub fn public(&self) -> &PublicClient {
        &self.public
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Credential change notifications for both domains
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialChange> {
        self.store.subscribe()
    }

    /// Hand the sign-in/notice event stream to the UI shell.
    ///
    /// Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("user", &self.user)
            .field("employer", &self.employer)
            .field("public", &self.public)
            .field("events_taken", &self.events.is_none())
            .finish()
    }
}
