//! Public dispatcher for unauthenticated endpoints
//!
//! No credential store, no coordinator. Job listings, sign-up and other
//! open endpoints go through here so credential handling never leaks into
//! anonymous flows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobhub_domain::constants::{CONTENT_TYPE_HEADER, DEFAULT_REQUEST_TIMEOUT_SECS};
use jobhub_domain::{ApiResponse, HttpRequest, OutboundRequest, Result};
use tracing::{debug, instrument};

use super::api::Dispatcher;
use super::dispatcher::{normalize_base_url, send};
use super::ports::Transport;

/// Pass-through API client
#[derive(Clone)]
pub struct PublicClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
}

impl PublicClient {
    /// Create a client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            transport,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Dispatcher for PublicClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.route()))]
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse> {
        let mut headers = request.headers.clone();
        if request.body.is_multipart() {
            headers.remove(CONTENT_TYPE_HEADER);
        }

        let outbound = OutboundRequest {
            method: request.method,
            url: format!("{}{}", self.base_url, request.path),
            query: request.query.clone(),
            headers,
            body: request.body.clone(),
            timeout: request.timeout.unwrap_or(self.request_timeout),
        };

        let response = send(self.transport.as_ref(), outbound, request.route()).await?;
        debug!(status = response.status, "Public request succeeded");
        Ok(response)
    }
}

impl std::fmt::Debug for PublicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicClient").field("base_url", &self.base_url).finish()
    }
}
