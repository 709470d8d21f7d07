//! Account domains
//!
//! Each class of principal (ordinary user, employer) gets its own storage
//! keys, API prefix, exempt endpoints and sign-in route. Domains never share
//! credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CREATE_PASSWORD_PATH, EMPLOYER_ACCESS_KEY, EMPLOYER_API_PREFIX, EMPLOYER_REFRESH_HEADER,
    EMPLOYER_REFRESH_KEY, EMPLOYER_SIGN_IN_ROUTE, FORGOT_PASSWORD_PATH, GOOGLE_CALLBACK_PATH,
    LINKEDIN_CALLBACK_PATH, REFRESH_PATH, RESET_PASSWORD_PATH, SESSION_EXPIRED_NOTICE,
    SIGN_IN_PATH, SIGN_OUT_PATH, USER_ACCESS_KEY, USER_API_PREFIX, USER_REFRESH_HEADER,
    USER_REFRESH_KEY, USER_SIGN_IN_ROUTE, VERIFY_EMAIL_PATH,
};

/// Namespace separating credentials and endpoints for one class of principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountDomain {
    User,
    Employer,
}

impl AccountDomain {
    pub const ALL: [Self; 2] = [Self::User, Self::Employer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Employer => "employer",
        }
    }

    /// Static configuration for this domain.
    pub fn profile(self) -> &'static DomainProfile {
        match self {
            Self::User => &USER_PROFILE,
            Self::Employer => &EMPLOYER_PROFILE,
        }
    }
}

impl fmt::Display for AccountDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the session layer needs to know about one account domain.
///
/// Paths are relative to the domain's API prefix, which is itself appended
/// to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainProfile {
    pub domain: AccountDomain,
    pub api_prefix: &'static str,
    pub access_key: &'static str,
    pub refresh_key: &'static str,
    pub refresh_path: &'static str,
    pub sign_out_path: &'static str,
    pub refresh_header: &'static str,
    pub sign_in_route: &'static str,
    pub exempt_paths: &'static [&'static str],
    pub expired_notice: &'static str,
}

static USER_PROFILE: DomainProfile = DomainProfile {
    domain: AccountDomain::User,
    api_prefix: USER_API_PREFIX,
    access_key: USER_ACCESS_KEY,
    refresh_key: USER_REFRESH_KEY,
    refresh_path: REFRESH_PATH,
    sign_out_path: SIGN_OUT_PATH,
    refresh_header: USER_REFRESH_HEADER,
    sign_in_route: USER_SIGN_IN_ROUTE,
    exempt_paths: &[
        SIGN_IN_PATH,
        SIGN_OUT_PATH,
        REFRESH_PATH,
        FORGOT_PASSWORD_PATH,
        RESET_PASSWORD_PATH,
        VERIFY_EMAIL_PATH,
        GOOGLE_CALLBACK_PATH,
        LINKEDIN_CALLBACK_PATH,
    ],
    expired_notice: SESSION_EXPIRED_NOTICE,
};

static EMPLOYER_PROFILE: DomainProfile = DomainProfile {
    domain: AccountDomain::Employer,
    api_prefix: EMPLOYER_API_PREFIX,
    access_key: EMPLOYER_ACCESS_KEY,
    refresh_key: EMPLOYER_REFRESH_KEY,
    refresh_path: REFRESH_PATH,
    sign_out_path: SIGN_OUT_PATH,
    refresh_header: EMPLOYER_REFRESH_HEADER,
    sign_in_route: EMPLOYER_SIGN_IN_ROUTE,
    exempt_paths: &[
        SIGN_IN_PATH,
        SIGN_OUT_PATH,
        REFRESH_PATH,
        FORGOT_PASSWORD_PATH,
        RESET_PASSWORD_PATH,
        VERIFY_EMAIL_PATH,
        CREATE_PASSWORD_PATH,
    ],
    expired_notice: SESSION_EXPIRED_NOTICE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains_never_share_storage_keys() {
        let user = AccountDomain::User.profile();
        let employer = AccountDomain::Employer.profile();

        assert_ne!(user.access_key, employer.access_key);
        assert_ne!(user.refresh_key, employer.refresh_key);
        assert_ne!(user.refresh_header, employer.refresh_header);
        assert_ne!(user.sign_in_route, employer.sign_in_route);
        assert_ne!(user.api_prefix, employer.api_prefix);
    }

    #[test]
    fn test_auth_endpoints_are_exempt_in_both_domains() {
        for domain in AccountDomain::ALL {
            let profile = domain.profile();
            assert_eq!(profile.domain, domain);
            assert!(profile.exempt_paths.contains(&profile.refresh_path));
            assert!(profile.exempt_paths.contains(&profile.sign_out_path));
            assert!(profile.exempt_paths.contains(&SIGN_IN_PATH));
        }
    }

    #[test]
    fn test_domain_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AccountDomain::Employer).unwrap(), "\"employer\"");
        assert_eq!(AccountDomain::User.to_string(), "user");
    }
}
