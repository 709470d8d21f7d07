//! Test doubles for the session ports
//!
//! Enabled for this crate's own tests and for downstream crates through the
//! `test-utils` feature.

use std::time::Duration;

use async_trait::async_trait;
use jobhub_domain::{AccountDomain, ApiResponse, OutboundRequest, TransportError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::session::{SessionNavigator, Transport};

/// Scripted answer for one request
#[derive(Debug, Clone)]
pub struct Reply {
    delay: Duration,
    result: Result<ApiResponse, TransportError>,
}

impl Reply {
    /// Empty-bodied response with `status`
    pub fn status(status: u16) -> Self {
        Self { delay: Duration::ZERO, result: Ok(ApiResponse::new(status, Vec::new())) }
    }

    /// JSON response with `status`
    pub fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> Self {
        Self { delay: Duration::ZERO, result: Ok(ApiResponse::json_body(status, body)) }
    }

    /// Plain-text response with `status`
    pub fn text(status: u16, body: &str) -> Self {
        Self { delay: Duration::ZERO, result: Ok(ApiResponse::new(status, body.as_bytes().to_vec())) }
    }

    /// Transport-level failure, no response at all
    pub fn error(error: TransportError) -> Self {
        Self { delay: Duration::ZERO, result: Err(error) }
    }

    /// Answer only after `delay` of (tokio) time
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Box<dyn Fn(&OutboundRequest) -> Reply + Send + Sync>;

/// [`Transport`] answering from a closure and recording every request
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&OutboundRequest) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request sent so far, in send order
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    /// Requests whose URL ends with `suffix`
    pub fn requests_to(&self, suffix: &str) -> Vec<OutboundRequest> {
        self.requests.lock().iter().filter(|r| r.url.ends_with(suffix)).cloned().collect()
    }

    pub fn calls_to(&self, suffix: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url.ends_with(suffix)).count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
        let reply = (self.handler)(&request);
        self.requests.lock().push(request);

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

/// [`SessionNavigator`] that records redirects and notices
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<(AccountDomain, String)>>,
    notices: Mutex<Vec<(AccountDomain, String)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<(AccountDomain, String)> {
        self.redirects.lock().clone()
    }

    pub fn notices(&self) -> Vec<(AccountDomain, String)> {
        self.notices.lock().clone()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.lock().len()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.lock().len()
    }
}

impl SessionNavigator for RecordingNavigator {
    fn redirect_to_sign_in(&self, domain: AccountDomain, route: &str) {
        self.redirects.lock().push((domain, route.to_string()));
    }

    fn notify(&self, domain: AccountDomain, message: &str) {
        self.notices.lock().push((domain, message.to_string()));
    }
}
