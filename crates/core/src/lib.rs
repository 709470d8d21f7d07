//! # JobHub Core
//!
//! Session logic for the JobHub API client - no infrastructure dependencies.
//!
//! This crate contains:
//! - The per-domain credential store and its storage port
//! - The authenticated dispatcher with single-flight refresh coordination
//! - The public (credential-free) dispatcher
//! - Port interfaces for transport and sign-in navigation
//!
//! ## Architecture Principles
//! - Only depends on `jobhub-domain`
//! - No HTTP or keychain code; adapters live in `jobhub-infra`
//! - All external effects go through traits

pub mod credentials;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use credentials::{CredentialStore, MemorySecretStorage, SecretStorage};
pub use session::{
    Dispatcher, ExemptPaths, PublicClient, Recovery, RefreshCoordinator, RefreshFailure,
    RequestEnvelope, SessionClient, SessionClientBuilder, SessionNavigator, Transport,
};
