//! Configuration loader
//!
//! Loads session configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment if one exists
//! 2. Attempts to load from environment variables
//! 3. If `JOBHUB_API_BASE_URL` is missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `JOBHUB_API_BASE_URL`: API base URL (required for env loading)
//! - `JOBHUB_REQUEST_TIMEOUT_SECS`: Default request timeout in seconds
//! - `JOBHUB_REFRESH_TIMEOUT_SECS`: Refresh call timeout in seconds
//! - `JOBHUB_STORAGE_BACKEND`: `keychain` or `memory`
//! - `JOBHUB_KEYCHAIN_SERVICE`: Keychain service name
//! - `JOBHUB_LOG_FILTER`: Tracing filter directive
//! - `JOBHUB_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./jobhub.{json,toml}` or `./config.{json,toml}` (current working directory)
//! 2. `../` and `../../` variants of the same names
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use jobhub_domain::{
    ApiError, ApiSettings, Config, LoggingSettings, Result, StorageBackend, StorageSettings,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["jobhub.json", "jobhub.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value has the wrong type
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `JOBHUB_API_BASE_URL` is required; every other setting falls back
/// to its default.
///
/// # Errors
/// Returns `ApiError::Config` if the base URL is missing or a variable has
/// an invalid value.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("JOBHUB_API_BASE_URL")?;
    let defaults = ApiSettings::default();

    let request_timeout_secs =
        env_secs("JOBHUB_REQUEST_TIMEOUT_SECS")?.unwrap_or(defaults.request_timeout_secs);
    let refresh_timeout_secs =
        env_secs("JOBHUB_REFRESH_TIMEOUT_SECS")?.unwrap_or(defaults.refresh_timeout_secs);

    let mut storage = StorageSettings::default();
    if let Ok(backend) = std::env::var("JOBHUB_STORAGE_BACKEND") {
        storage.backend = backend.parse::<StorageBackend>().map_err(ApiError::Config)?;
    }
    if let Ok(service_name) = std::env::var("JOBHUB_KEYCHAIN_SERVICE") {
        storage.service_name = service_name;
    }

    let mut logging = LoggingSettings::default();
    if let Ok(filter) = std::env::var("JOBHUB_LOG_FILTER") {
        logging.filter = filter;
    }
    logging.json = env_bool("JOBHUB_LOG_JSON", logging.json);

    Ok(Config {
        api: ApiSettings { base_url, request_timeout_secs, refresh_timeout_secs },
        storage,
        logging,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ApiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ApiError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ApiError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ApiError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ApiError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional whole number of seconds
fn env_secs(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ApiError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
