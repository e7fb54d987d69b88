//! Configuration loader
//!
//! Loads repository client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `GRAPHDB_ENDPOINTS` is missing or a value is invalid, falls back to
//!    loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GRAPHDB_ENDPOINTS`: Comma-separated repository URLs, in failover order
//! - `GRAPHDB_USERNAME` / `GRAPHDB_PASSWORD`: Login credentials
//! - `GRAPHDB_AUTH_MODE`: `none`, `basic` or `token`
//! - `GRAPHDB_RETRY_COUNT`: Retries per endpoint
//! - `GRAPHDB_READ_TIMEOUT_MS` / `GRAPHDB_WRITE_TIMEOUT_MS`: Per-attempt
//!   timeouts in milliseconds
//!
//! ## File Locations
//! The loader probes `graphdb.toml` and `graphdb.json` in the current working
//! directory, its parent, and next to the executable.
//!
//! When credentials are given without an auth mode, token authentication is
//! assumed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use graphdb_domain::{
    AuthMode, ClientConfig, Credentials, GraphDbError, RepositoryClientConfig, Result,
};
use serde::Deserialize;

const CONFIG_FILE_NAMES: [&str; 2] = ["graphdb.toml", "graphdb.json"];

/// Settings as they appear in a config file or the environment
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    endpoints: Vec<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    auth_mode: Option<String>,
    #[serde(default)]
    retry_count: Option<u32>,
    #[serde(default)]
    retry_backoff_ms: Option<u64>,
    #[serde(default)]
    retriable_statuses: Option<Vec<u16>>,
    #[serde(default)]
    read_timeout_ms: Option<u64>,
    #[serde(default)]
    write_timeout_ms: Option<u64>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    default_rdf_mime_type: Option<String>,
    #[serde(default)]
    default_query_mime_type: Option<String>,
}

impl Settings {
    fn into_config(self) -> Result<RepositoryClientConfig> {
        let mut client = ClientConfig::default();

        for (name, value) in self.headers {
            client = client.with_header(&name, value);
        }
        if let Some(retries) = self.retry_count {
            client = client.with_retry_count(retries);
        }
        if let Some(ms) = self.retry_backoff_ms {
            client = client.with_retry_backoff(Duration::from_millis(ms));
        }
        if let Some(statuses) = self.retriable_statuses {
            client.retriable_statuses = statuses.into_iter().collect();
        }
        if let Some(ms) = self.read_timeout_ms {
            client = client.with_read_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.write_timeout_ms {
            client = client.with_write_timeout(Duration::from_millis(ms));
        }

        let username = self.username.filter(|u| !u.trim().is_empty());
        client.auth_mode = match (self.auth_mode.as_deref(), &username) {
            (Some(mode), _) => AuthMode::parse(mode)?,
            (None, Some(_)) => AuthMode::Token,
            (None, None) => AuthMode::None,
        };
        client.credentials =
            username.map(|user| Credentials::new(user, self.password.unwrap_or_default()));

        let mut config = RepositoryClientConfig::new(self.endpoints).with_client(client);
        if let Some(mime) = self.default_rdf_mime_type {
            config.default_rdf_mime_type = mime;
        }
        if let Some(mime) = self.default_query_mime_type {
            config.default_query_mime_type = mime;
        }

        config.endpoint_set()?;
        Ok(config)
    }
}

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the endpoint list is
/// missing or a value is invalid, falls back to loading from a config file.
///
/// # Errors
/// Returns `GraphDbError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The endpoint list is empty or contains malformed URLs
pub fn load() -> Result<RepositoryClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!(
                endpoints = config.endpoints.len(),
                "Configuration loaded from environment variables"
            );
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
/// Only `GRAPHDB_ENDPOINTS` is required; see module documentation for the
/// complete list.
///
/// # Errors
/// Returns `GraphDbError::Config` if `GRAPHDB_ENDPOINTS` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<RepositoryClientConfig> {
    let endpoints = env_var("GRAPHDB_ENDPOINTS")?
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
        .collect();

    Settings {
        endpoints,
        username: std::env::var("GRAPHDB_USERNAME").ok(),
        password: std::env::var("GRAPHDB_PASSWORD").ok(),
        auth_mode: std::env::var("GRAPHDB_AUTH_MODE").ok(),
        retry_count: env_parse("GRAPHDB_RETRY_COUNT")?,
        read_timeout_ms: env_parse("GRAPHDB_READ_TIMEOUT_MS")?,
        write_timeout_ms: env_parse("GRAPHDB_WRITE_TIMEOUT_MS")?,
        ..Settings::default()
    }
    .into_config()
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for a config file.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GraphDbError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<RepositoryClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GraphDbError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GraphDbError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GraphDbError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `GraphDbError::Config` if the format is unsupported, parsing fails
/// or the resulting configuration is invalid.
pub fn parse_config(contents: &str, path: &Path) -> Result<RepositoryClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let settings: Settings = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GraphDbError::Config(format!("Invalid TOML format: {e}")))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| GraphDbError::Config(format!("Invalid JSON format: {e}")))?,
        _ => return Err(GraphDbError::Config(format!("Unsupported config format: {extension}"))),
    };

    settings.into_config()
}

/// Probe the standard locations for a configuration file
///
/// Searches the current working directory, its parent, and the executable's
/// directory, returning the first file that exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut directories = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd.join(".."));
        directories.insert(0, cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            directories.push(exe_dir.to_path_buf());
        }
    }

    directories
        .iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| GraphDbError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| GraphDbError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
