//! # JobHub Domain
//!
//! Value types shared by the JobHub session layer.
//!
//! This crate contains:
//! - Account domains and their static per-domain profiles
//! - Credential pairs and the typed credential change event
//! - HTTP request/response values exchanged with the transport port
//! - Error taxonomy and configuration structures
//!
//! ## Architecture
//! - No dependencies on other JobHub crates
//! - No I/O; only external dependencies for serialization and errors

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
