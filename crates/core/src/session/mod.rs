//! Authenticated and public request dispatch
//!
//! - [`SessionClient`]: per-domain client that attaches credentials and
//!   recovers from stale ones through its [`RefreshCoordinator`]
//! - [`PublicClient`]: credential-free pass-through
//! - [`ExemptPaths`]: endpoints where a 401 is a final answer
//! - [`Transport`] / [`SessionNavigator`]: ports implemented in infra

mod api;
mod coordinator;
mod dispatcher;
mod envelope;
mod exempt;
mod ports;
mod public;

#[cfg(test)]
mod tests;

pub use api::Dispatcher;
pub use coordinator::{Recovery, RefreshCoordinator, RefreshFailure};
pub use dispatcher::{SessionClient, SessionClientBuilder};
pub use envelope::RequestEnvelope;
pub use exempt::ExemptPaths;
pub use ports::{SessionNavigator, Transport};
pub use public::PublicClient;
