//! Credential pair and the typed change signal

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountDomain;

/// Access/refresh token pair for one account domain.
///
/// Serialized with the wire names used by the refresh endpoint body. The
/// `Debug` output never includes the token values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// `Authorization` header value for this pair.
    pub fn bearer(&self) -> String {
        format!("{}{}", crate::constants::BEARER_PREFIX, self.access_token)
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Published on every credential store mutation.
///
/// Listeners get the before/after state directly instead of re-reading the
/// store. Delivery is best-effort; no ordering across processes is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialChange {
    pub domain: AccountDomain,
    pub previous: Option<CredentialPair>,
    pub next: Option<CredentialPair>,
    pub at: DateTime<Utc>,
}

impl CredentialChange {
    pub fn is_sign_out(&self) -> bool {
        self.next.is_none()
    }
}
