//! Authenticated request dispatcher
//!
//! [`SessionClient`] attaches the stored access token to every call, adapts
//! multipart headers, and hands 401s to its [`RefreshCoordinator`]. One
//! client exists per account domain; both may share a credential store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobhub_domain::constants::{
    AUTHORIZATION_HEADER, CONTENT_TYPE_HEADER, DEFAULT_REFRESH_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use jobhub_domain::{
    AccountDomain, ApiError, ApiResponse, CoordinatorPhase, CredentialPair, HttpRequest,
    OutboundRequest, Result,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::api::Dispatcher;
use super::coordinator::{Recovery, RefreshCoordinator};
use super::envelope::RequestEnvelope;
use super::ports::{SessionNavigator, Transport};
use crate::credentials::CredentialStore;

/// Credential-carrying API client for one account domain
#[derive(Clone)]
pub struct SessionClient {
    domain: AccountDomain,
    base_url: String,
    store: Arc<CredentialStore>,
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
    request_timeout: Duration,
}

impl SessionClient {
    /// Create a builder for `domain`
    pub fn builder(domain: AccountDomain) -> SessionClientBuilder {
        SessionClientBuilder::new(domain)
    }

    pub fn domain(&self) -> AccountDomain {
        self.domain
    }

    /// Base URL joined with this domain's API prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.coordinator.phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated(self.domain)
    }

    /// Persist the pair returned by a sign-in response.
    ///
    /// Any new credential write also lifts a previous refresh failure.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the pair cannot be persisted
    pub fn sign_in(&self, pair: CredentialPair) -> Result<()> {
        self.store.set(self.domain, pair)?;
        info!(domain = %self.domain, "Signed in");
        Ok(())
    }

    /// Call the domain's sign-out endpoint and drop local credentials.
    ///
    /// Local credentials are cleared even when the server call fails; the
    /// server error is still returned.
    ///
    /// # Errors
    ///
    /// Returns the sign-out call's error, or `ApiError::Storage` if local
    /// credentials cannot be cleared
    pub async fn sign_out(&self) -> Result<()> {
        let path = self.domain.profile().sign_out_path;
        match self.execute(HttpRequest::post(path)).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(domain = %self.domain, error = %err, "Sign-out call failed, clearing locally");
                self.store.clear(self.domain)?;
                Err(err)
            }
        }
    }

    fn prepare(
        &self,
        request: &HttpRequest,
        replay: Option<&CredentialPair>,
    ) -> Result<OutboundRequest> {
        let bearer = match replay {
            Some(pair) => Some(pair.bearer()),
            None => self.store.get(self.domain)?.map(|pair| pair.bearer()),
        };

        let mut headers = request.headers.clone();
        if let Some(bearer) = bearer {
            headers.insert(AUTHORIZATION_HEADER, bearer);
        }
        if request.body.is_multipart() {
            // The transport writes its own boundary.
            headers.remove(CONTENT_TYPE_HEADER);
        }

        Ok(OutboundRequest {
            method: request.method,
            url: format!("{}{}", self.base_url, request.path),
            query: request.query.clone(),
            headers,
            body: request.body.clone(),
            timeout: request.timeout.unwrap_or(self.request_timeout),
        })
    }

    fn observe_success(&self, request: &HttpRequest) {
        if request.route() != self.domain.profile().sign_out_path {
            return;
        }
        match self.store.clear(self.domain) {
            Ok(()) => info!(domain = %self.domain, "Signed out"),
            Err(err) => warn!(domain = %self.domain, error = %err, "Failed to clear credentials"),
        }
    }
}

#[async_trait]
impl Dispatcher for SessionClient {
    #[instrument(
        skip(self, request),
        fields(domain = %self.domain, method = %request.method, path = %request.route(), request_id)
    )]
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse> {
        let mut envelope = RequestEnvelope::new(request);
        tracing::Span::current().record("request_id", tracing::field::display(envelope.id()));

        let mut replay: Option<CredentialPair> = None;
        loop {
            let outbound = self.prepare(envelope.request(), replay.as_ref())?;
            let error = match send(self.transport.as_ref(), outbound, envelope.request().route()).await
            {
                Ok(response) => {
                    debug!(status = response.status, retried = envelope.is_retried(), "Request succeeded");
                    self.observe_success(envelope.request());
                    return Ok(response);
                }
                Err(error) => error,
            };

            match self.coordinator.recover(&envelope, &error).await {
                Recovery::Replay(pair) => {
                    debug!("Replaying request with refreshed credentials");
                    envelope.mark_retried();
                    replay = Some(pair);
                }
                Recovery::PassThrough | Recovery::Rejected => return Err(error),
            }
        }
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builder for [`SessionClient`]
pub struct SessionClientBuilder {
    domain: AccountDomain,
    base_url: Option<String>,
    store: Option<Arc<CredentialStore>>,
    transport: Option<Arc<dyn Transport>>,
    navigator: Option<Arc<dyn SessionNavigator>>,
    request_timeout: Duration,
    refresh_timeout: Duration,
}

impl SessionClientBuilder {
    fn new(domain: AccountDomain) -> Self {
        Self {
            domain,
            base_url: None,
            store: None,
            transport: None,
            navigator: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
        }
    }

    /// API base URL shared by both domains (the domain prefix is appended)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn SessionNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Default timeout for ordinary requests
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fixed timeout for the refresh call
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if a collaborator is missing or the base
    /// URL is not an absolute http(s) URL
    pub fn build(self) -> Result<SessionClient> {
        let base_url = self.base_url.ok_or_else(|| ApiError::Config("Base URL not set".into()))?;
        let store = self.store.ok_or_else(|| ApiError::Config("Credential store not set".into()))?;
        let transport = self.transport.ok_or_else(|| ApiError::Config("Transport not set".into()))?;
        let navigator = self.navigator.ok_or_else(|| ApiError::Config("Navigator not set".into()))?;

        let base_url =
            format!("{}{}", normalize_base_url(&base_url)?, self.domain.profile().api_prefix);

        let coordinator = RefreshCoordinator::new(
            self.domain,
            &base_url,
            store.clone(),
            transport.clone(),
            navigator,
            self.refresh_timeout,
        );

        Ok(SessionClient {
            domain: self.domain,
            base_url,
            store,
            transport,
            coordinator,
            request_timeout: self.request_timeout,
        })
    }
}

/// Validate `raw` and strip any trailing slash
pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed =
        Url::parse(raw).map_err(|e| ApiError::Config(format!("Invalid base URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!("Unsupported base URL scheme '{}'", parsed.scheme())));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Send through `transport` under the request's own timeout and map
/// non-2xx statuses to errors.
pub(crate) async fn send(
    transport: &dyn Transport,
    request: OutboundRequest,
    route: &str,
) -> Result<ApiResponse> {
    let timeout = request.timeout;
    let response = match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(result) => result?,
        Err(_) => return Err(ApiError::Timeout(timeout)),
    };

    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_status(response.status, route, response.text()))
    }
}
