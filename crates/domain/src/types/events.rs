//! Session lifecycle events surfaced to the UI layer

use serde::{Deserialize, Serialize};

use super::account::AccountDomain;

/// Refresh coordinator state for one account domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorPhase {
    /// No refresh in flight
    Idle,
    /// One shared refresh is in flight; stale failures queue behind it
    Refreshing,
    /// The last refresh failed; stale failures force sign-in until a new
    /// credential write
    Failed,
}

/// Outcome the UI shell must act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Navigate to the sign-in route for `domain`
    SignInRequired { domain: AccountDomain, route: String },
    /// Show a transient notice
    Notice { domain: AccountDomain, message: String },
}
