//! Configuration loading
//!
//! Reads [`jobhub_domain::Config`] from `JOBHUB_*` environment variables,
//! falling back to a JSON or TOML file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
