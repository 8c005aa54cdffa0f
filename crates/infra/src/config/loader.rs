//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `XERO_CLIENT_ID` and `XERO_CLIENT_SECRET` are set, configuration is
//!    built from the environment on top of defaults
//! 2. Otherwise the first config file found is used
//! 3. `LEDGERBRIDGE_*` overrides apply in both cases
//!
//! ## Environment Variables
//! - `XERO_CLIENT_ID`, `XERO_CLIENT_SECRET`: client credentials (required
//!   for the environment path)
//! - `XERO_REDIRECT_URI`: redirect URI registered with the app
//! - `XERO_SCOPES`: space or comma separated scope list
//! - `XERO_TENANT_ID`: tenant to use before discovery
//! - `LEDGERBRIDGE_CONNECTION_ID`, `LEDGERBRIDGE_API_BASE_URL`,
//!   `LEDGERBRIDGE_CONNECTIONS_URL`, `LEDGERBRIDGE_TOKEN_URL`,
//!   `LEDGERBRIDGE_AUTHORIZE_URL`, `LEDGERBRIDGE_HTTP_TIMEOUT_SECS`,
//!   `LEDGERBRIDGE_HTTP_MAX_ATTEMPTS`, `LEDGERBRIDGE_TOKEN_PATH`,
//!   `LEDGERBRIDGE_SETTINGS_PATH`, `LEDGERBRIDGE_ATTACHMENTS_DIR`,
//!   `LEDGERBRIDGE_LOG`, `LEDGERBRIDGE_LOG_JSON`
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./ledgerbridge.{json,toml}` then `./config.{json,toml}`
//! 2. The same names one and two directories up
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use ledgerbridge_domain::{AppConfig, ConnectionId, LedgerBridgeError, Result};

const CONFIG_NAMES: &[&str] =
    &["ledgerbridge.json", "ledgerbridge.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LedgerBridgeError::Config` if neither the environment nor any
/// config file yields a usable configuration, or an override is malformed.
pub fn load() -> Result<AppConfig> {
    let env = |key: &str| std::env::var(key).ok();

    match load_from_env_with(env) {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment incomplete, trying config file");
            let config = load_from_file(None)?;
            apply_overrides(config, env)
        }
    }
}

/// Load configuration from process environment variables
///
/// # Errors
/// Returns `LedgerBridgeError::Config` if the client credentials are missing
/// or an override has an invalid value.
pub fn load_from_env() -> Result<AppConfig> {
    load_from_env_with(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable lookup.
///
/// # Errors
/// See [`load_from_env`].
pub fn load_from_env_with<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let client_id = required(&lookup, "XERO_CLIENT_ID")?;
    let client_secret = required(&lookup, "XERO_CLIENT_SECRET")?;

    let mut config = AppConfig::default();
    config.connection.client_id = client_id;
    config.connection.client_secret = client_secret;

    apply_overrides(config, lookup)
}

/// Apply every recognized variable on top of `config`.
///
/// # Errors
/// Returns `LedgerBridgeError::Config` for unparsable numeric or boolean
/// values.
pub fn apply_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("XERO_CLIENT_ID") {
        config.connection.client_id = v;
    }
    if let Some(v) = get("XERO_CLIENT_SECRET") {
        config.connection.client_secret = v;
    }
    if let Some(v) = get("XERO_REDIRECT_URI") {
        config.connection.redirect_uri = v;
    }
    if let Some(v) = get("XERO_TENANT_ID") {
        config.connection.tenant_id = Some(v);
    }
    if let Some(v) = get("XERO_SCOPES") {
        config.oauth.scopes = parse_scopes(&v);
    }

    if let Some(v) = get("LEDGERBRIDGE_CONNECTION_ID") {
        config.connection_id = ConnectionId::new(v);
    }
    if let Some(v) = get("LEDGERBRIDGE_API_BASE_URL") {
        config.api.base_url = v;
    }
    if let Some(v) = get("LEDGERBRIDGE_CONNECTIONS_URL") {
        config.api.connections_url = v;
    }
    if let Some(v) = get("LEDGERBRIDGE_TOKEN_URL") {
        config.oauth.token_url = v;
    }
    if let Some(v) = get("LEDGERBRIDGE_AUTHORIZE_URL") {
        config.oauth.authorize_url = v;
    }
    if let Some(v) = get("LEDGERBRIDGE_HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = v.parse::<u64>().map_err(|e| {
            LedgerBridgeError::Config(format!("Invalid HTTP timeout: {}", e))
        })?;
    }
    if let Some(v) = get("LEDGERBRIDGE_HTTP_MAX_ATTEMPTS") {
        config.http.max_attempts = v.parse::<u32>().map_err(|e| {
            LedgerBridgeError::Config(format!("Invalid HTTP max attempts: {}", e))
        })?;
    }
    if let Some(v) = get("LEDGERBRIDGE_TOKEN_PATH") {
        config.storage.token_path = PathBuf::from(v);
    }
    if let Some(v) = get("LEDGERBRIDGE_SETTINGS_PATH") {
        config.storage.settings_path = PathBuf::from(v);
    }
    if let Some(v) = get("LEDGERBRIDGE_ATTACHMENTS_DIR") {
        config.storage.attachments_dir = PathBuf::from(v);
    }
    if let Some(v) = get("LEDGERBRIDGE_LOG") {
        config.logging.filter = v;
    }
    if let Some(v) = get("LEDGERBRIDGE_LOG_JSON") {
        config.logging.json = parse_bool(&v).ok_or_else(|| {
            LedgerBridgeError::Config(format!("Invalid boolean for LEDGERBRIDGE_LOG_JSON: {v}"))
        })?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations. Format is detected by
/// extension.
///
/// # Errors
/// Returns `LedgerBridgeError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LedgerBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => find_config_path().ok_or_else(|| {
            LedgerBridgeError::Config(
                "No client credentials in the environment and no config file found".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LedgerBridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LedgerBridgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LedgerBridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(LedgerBridgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the standard locations.
pub fn find_config_path() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        LedgerBridgeError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
