//! Sign-in navigator adapters
//!
//! The coordinator reports teardown through [`SessionNavigator`]. A UI shell
//! subscribes to [`ChannelNavigator`] events; headless hosts can use
//! [`TracingNavigator`] and simply log the outcome.

use jobhub_core::SessionNavigator;
use jobhub_domain::{AccountDomain, SessionEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Forwards navigation requests as [`SessionEvent`]s over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelNavigator {
    /// Create the navigator and the receiving end for the UI shell
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event receiver dropped, event discarded");
        }
    }
}

impl SessionNavigator for ChannelNavigator {
    fn redirect_to_sign_in(&self, domain: AccountDomain, route: &str) {
        self.publish(SessionEvent::SignInRequired { domain, route: route.to_string() });
    }

    fn notify(&self, domain: AccountDomain, message: &str) {
        self.publish(SessionEvent::Notice { domain, message: message.to_string() });
    }
}

/// Logs navigation requests and does nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl SessionNavigator for TracingNavigator {
    fn redirect_to_sign_in(&self, domain: AccountDomain, route: &str) {
        info!(domain = %domain, route = %route, "Sign-in required");
    }

    fn notify(&self, domain: AccountDomain, message: &str) {
        info!(domain = %domain, notice = %message, "Session notice");
    }
}
