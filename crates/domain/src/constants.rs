//! Session layer constants
//!
//! Centralized location for header names, storage keys, routes, and
//! default timeouts used by both account domains.

// Headers
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const USER_REFRESH_HEADER: &str = "x-refresh-token";
pub const EMPLOYER_REFRESH_HEADER: &str = "x-employer-refresh-token";

// Persisted credential keys (one access/refresh pair per account domain)
pub const USER_ACCESS_KEY: &str = "accessToken";
pub const USER_REFRESH_KEY: &str = "refreshToken";
pub const EMPLOYER_ACCESS_KEY: &str = "employerAccessToken";
pub const EMPLOYER_REFRESH_KEY: &str = "employerRefreshToken";

// API prefixes, relative to the configured base URL
pub const USER_API_PREFIX: &str = "";
pub const EMPLOYER_API_PREFIX: &str = "/employer";

// Auth endpoints, relative to the domain API prefix
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const SIGN_IN_PATH: &str = "/auth/login";
pub const SIGN_OUT_PATH: &str = "/auth/logout";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
pub const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";
pub const CREATE_PASSWORD_PATH: &str = "/auth/create-password";
pub const GOOGLE_CALLBACK_PATH: &str = "/auth/google/callback";
pub const LINKEDIN_CALLBACK_PATH: &str = "/auth/linkedin/callback";

// Client-side sign-in routes used for the fail-closed redirect
pub const USER_SIGN_IN_ROUTE: &str = "/login";
pub const EMPLOYER_SIGN_IN_ROUTE: &str = "/employer/login";

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

// Defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "jobhub.session";
pub const CREDENTIAL_CHANGE_CAPACITY: usize = 64;
