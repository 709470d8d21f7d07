//! Port interfaces for the session layer
//!
//! The dispatchers depend on these traits only; infra supplies the reqwest
//! transport and the UI-facing navigator.

use async_trait::async_trait;
use jobhub_domain::{AccountDomain, ApiResponse, OutboundRequest, TransportError};

/// Sends prepared requests over the wire
///
/// Implementations honour `request.timeout` and never retry on their own.
/// Any HTTP status is a successful send; only failures to obtain a response
/// are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError>;
}

/// UI-side boundary notified when a domain's session is torn down
pub trait SessionNavigator: Send + Sync {
    /// Hard navigation to the sign-in route for `domain`
    fn redirect_to_sign_in(&self, domain: AccountDomain, route: &str);

    /// Show a transient user-visible notice
    fn notify(&self, domain: AccountDomain, message: &str);
}
