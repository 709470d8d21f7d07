//! Core session types

pub mod account;
pub mod credentials;
pub mod events;
pub mod http;

pub use account::{AccountDomain, DomainProfile};
pub use credentials::{CredentialChange, CredentialPair};
pub use events::{CoordinatorPhase, SessionEvent};
pub use http::{
    ApiResponse, Headers, HttpMethod, HttpRequest, MultipartPart, OutboundRequest, RequestBody,
};
