//! Refresh coordinator
//!
//! One coordinator per account domain. A 401 on a protected path either
//! joins the in-flight refresh ticket or creates it; every joined caller
//! replays once with the refreshed pair, or gives up together when the
//! refresh fails.
//!
//! The ticket is a shared future over a spawned task. The spawned task owns
//! all settlement effects (store write or teardown, redirect, notice), so
//! they run exactly once even if every waiting caller is dropped.
//!
//! After a failed refresh the domain stays failed until the credential store
//! records a newer successful write. Staleness is tracked by store revision
//! rather than a separate boolean, so a sign-in from anywhere clears it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use jobhub_domain::{
    AccountDomain, ApiError, CoordinatorPhase, CredentialPair, DomainProfile, Headers, HttpMethod,
    OutboundRequest, RequestBody, TransportError,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::envelope::RequestEnvelope;
use super::exempt::ExemptPaths;
use super::ports::{SessionNavigator, Transport};
use crate::credentials::CredentialStore;

/// Why a refresh attempt did not produce a usable pair.
///
/// Logged and kept on the ticket; callers waiting on the ticket get their
/// own original error back instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh transport failed: {0}")]
    Transport(String),

    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error("refresh rejected with status {status}")]
    Rejected { status: u16 },

    #[error("refresh response malformed: {0}")]
    MalformedBody(String),

    #[error("credential storage failed during refresh: {0}")]
    Storage(String),

    #[error("refresh task aborted")]
    Aborted,
}

/// What the dispatcher should do with a failed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Replay once with this freshly stored pair
    Replay(CredentialPair),
    /// Not a refreshable failure; hand the error back unchanged
    PassThrough,
    /// Recovery failed or was refused; the session for this domain is gone
    Rejected,
}

type Ticket = Shared<BoxFuture<'static, Result<CredentialPair, RefreshFailure>>>;

#[derive(Default)]
struct CoordinatorState {
    ticket: Option<Ticket>,
    // Store revision at the moment the last refresh failed.
    failed_at: Option<u64>,
    storms: u64,
}

struct Inner {
    profile: &'static DomainProfile,
    exempt: ExemptPaths,
    store: Arc<CredentialStore>,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn SessionNavigator>,
    refresh_url: String,
    refresh_timeout: Duration,
    state: Mutex<CoordinatorState>,
}

/// Single-flight refresh and fail-closed escalation for one account domain
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// `domain_base` is the configured base URL joined with the domain's
    /// API prefix, without a trailing slash.
    pub fn new(
        domain: AccountDomain,
        domain_base: &str,
        store: Arc<CredentialStore>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn SessionNavigator>,
        refresh_timeout: Duration,
    ) -> Self {
        let profile = domain.profile();
        Self {
            inner: Arc::new(Inner {
                profile,
                exempt: ExemptPaths::for_domain(domain),
                store,
                transport,
                navigator,
                refresh_url: format!("{domain_base}{}", profile.refresh_path),
                refresh_timeout,
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    pub fn domain(&self) -> AccountDomain {
        self.inner.profile.domain
    }

    pub fn phase(&self) -> CoordinatorPhase {
        let state = self.inner.state.lock();
        if state.ticket.is_some() {
            CoordinatorPhase::Refreshing
        } else if self.inner.is_failed(&state) {
            CoordinatorPhase::Failed
        } else {
            CoordinatorPhase::Idle
        }
    }

    /// Whether the last refresh failed with no credential write since
    pub fn is_failed(&self) -> bool {
        let state = self.inner.state.lock();
        self.inner.is_failed(&state)
    }

    /// Number of refresh calls started by this coordinator
    pub fn storms(&self) -> u64 {
        self.inner.state.lock().storms
    }

    /// Decide how to recover from `error` returned for `envelope`.
    ///
    /// Only a 401 on a non-exempt path that has not been replayed yet is
    /// refreshable. Waits on the shared ticket when one applies.
    pub async fn recover(&self, envelope: &RequestEnvelope, error: &ApiError) -> Recovery {
        if !error.is_stale_credential()
            || envelope.is_retried()
            || self.inner.exempt.covers(envelope.request())
        {
            return Recovery::PassThrough;
        }

        let ticket = {
            let mut state = self.inner.state.lock();
            if self.inner.is_failed(&state) {
                drop(state);
                self.inner.reject_while_failed(envelope);
                return Recovery::Rejected;
            }

            match state.ticket.clone() {
                Some(ticket) => {
                    debug!(
                        domain = %self.domain(),
                        request_id = %envelope.id(),
                        "Joining in-flight refresh"
                    );
                    ticket
                }
                None => {
                    state.storms += 1;
                    info!(
                        domain = %self.domain(),
                        request_id = %envelope.id(),
                        storm = state.storms,
                        "Stale credentials, starting refresh"
                    );
                    let ticket = self.start_refresh();
                    state.ticket = Some(ticket.clone());
                    ticket
                }
            }
        };

        match ticket.await {
            Ok(pair) => Recovery::Replay(pair),
            Err(_) => Recovery::Rejected,
        }
    }

    // Must be called with the state lock held so check-and-create is one step.
    fn start_refresh(&self) -> Ticket {
        let inner = self.inner.clone();
        let task = tokio::spawn(Inner::run_refresh(inner.clone()));
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // The task never settled; do it here so the ticket is released.
                    warn!(domain = %inner.domain(), error = %err, "Refresh task aborted");
                    inner.settle_failure(&RefreshFailure::Aborted);
                    Err(RefreshFailure::Aborted)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    fn domain(&self) -> AccountDomain {
        self.profile.domain
    }

    fn is_failed(&self, state: &CoordinatorState) -> bool {
        state.failed_at.is_some_and(|at| at == self.store.revision(self.domain()))
    }

    fn reject_while_failed(&self, envelope: &RequestEnvelope) {
        warn!(
            domain = %self.domain(),
            request_id = %envelope.id(),
            path = %envelope.request().route(),
            "Stale credentials after failed refresh, forcing sign-in"
        );
        if let Err(err) = self.store.clear(self.domain()) {
            warn!(domain = %self.domain(), error = %err, "Failed to clear credentials");
        }
        self.navigator.redirect_to_sign_in(self.domain(), self.profile.sign_in_route);
    }

    #[instrument(name = "refresh", skip(inner), fields(domain = %inner.profile.domain))]
    async fn run_refresh(inner: Arc<Self>) -> Result<CredentialPair, RefreshFailure> {
        let outcome = match inner.request_pair().await {
            Ok(pair) => inner
                .store
                .set(inner.domain(), pair.clone())
                .map(|()| pair)
                .map_err(|err| RefreshFailure::Storage(err.to_string())),
            Err(failure) => Err(failure),
        };

        match &outcome {
            Ok(_) => {
                let mut state = inner.state.lock();
                state.ticket = None;
                state.failed_at = None;
                drop(state);
                info!("Refresh succeeded");
            }
            Err(failure) => inner.settle_failure(failure),
        }

        outcome
    }

    fn settle_failure(&self, failure: &RefreshFailure) {
        warn!(error = %failure, "Refresh failed, tearing down session");

        let (revision, cleared) = self.store.clear_at_revision(self.domain());
        if let Err(err) = cleared {
            warn!(error = %err, "Failed to clear credentials");
        }

        {
            let mut state = self.state.lock();
            state.ticket = None;
            // A sign-in after the clear has a newer revision and stays usable.
            state.failed_at = Some(revision);
        }

        self.navigator.redirect_to_sign_in(self.domain(), self.profile.sign_in_route);
        self.navigator.notify(self.domain(), self.profile.expired_notice);
    }

    async fn request_pair(&self) -> Result<CredentialPair, RefreshFailure> {
        let refresh_token = match self.store.get(self.domain()) {
            Ok(Some(pair)) => pair.refresh_token,
            Ok(None) => return Err(RefreshFailure::MissingRefreshToken),
            Err(err) => return Err(RefreshFailure::Storage(err.to_string())),
        };

        let mut headers = Headers::new();
        headers.insert(self.profile.refresh_header, refresh_token);

        let request = OutboundRequest {
            method: HttpMethod::Post,
            url: self.refresh_url.clone(),
            query: Vec::new(),
            headers,
            body: RequestBody::Empty,
            timeout: self.refresh_timeout,
        };

        debug!(url = %self.refresh_url, "Sending refresh request");
        let response =
            match tokio::time::timeout(self.refresh_timeout, self.transport.send(request)).await {
                Err(_) => return Err(RefreshFailure::Timeout(self.refresh_timeout)),
                Ok(Err(TransportError::Timeout(after))) => {
                    return Err(RefreshFailure::Timeout(after))
                }
                Ok(Err(err)) => return Err(RefreshFailure::Transport(err.to_string())),
                Ok(Ok(response)) => response,
            };

        if !response.is_success() {
            return Err(RefreshFailure::Rejected { status: response.status });
        }

        response.json::<CredentialPair>().map_err(|err| RefreshFailure::MalformedBody(err.to_string()))
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("domain", &self.domain())
            .field("phase", &self.phase())
            .field("refresh_url", &self.inner.refresh_url)
            .finish()
    }
}
