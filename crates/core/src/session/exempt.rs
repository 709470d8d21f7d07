//! Exempt-path registry
//!
//! Endpoints where a 401 is an expected answer (wrong password, expired
//! reset link) rather than a sign that the access token went stale.

use jobhub_domain::{AccountDomain, HttpRequest};

/// Static per-domain list of refresh-exempt paths
#[derive(Debug, Clone, Copy)]
pub struct ExemptPaths {
    paths: &'static [&'static str],
}

impl ExemptPaths {
    pub fn for_domain(domain: AccountDomain) -> Self {
        Self { paths: domain.profile().exempt_paths }
    }

    /// Exact match on `path` with any query string or fragment removed
    pub fn is_exempt(&self, path: &str) -> bool {
        let route = path.split(['?', '#']).next().unwrap_or(path);
        self.paths.contains(&route)
    }

    pub fn covers(&self, request: &HttpRequest) -> bool {
        self.is_exempt(request.route())
    }
}
