//! # JobHub Infrastructure
//!
//! Adapters for the ports defined in `jobhub-core`.
//!
//! This crate contains:
//! - The reqwest HTTP transport
//! - Platform keychain secret storage
//! - Sign-in navigators (event channel, tracing)
//! - Configuration loading and tracing setup
//! - [`SessionRuntime`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `jobhub-core`
//! - Contains all "impure" code (network, keychain, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod navigator;
pub mod observability;
pub mod runtime;
pub mod storage;

// Re-export commonly used items
pub use config::{load, load_from_env, load_from_file};
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use navigator::{ChannelNavigator, TracingNavigator};
pub use observability::init_tracing;
pub use runtime::SessionRuntime;
pub use storage::{secret_storage, KeychainSecretStorage};
