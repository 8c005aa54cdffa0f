//! Configuration structures
//!
//! Everything except the client credentials has a default, so a config file
//! only needs a `[connection]` section.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_AUTHORIZE_URL, DEFAULT_CONNECTIONS_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_REDIRECT_URI, DEFAULT_SCOPES, DEFAULT_TOKEN_URL,
};
use crate::types::ConnectionId;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub connection_id: ConnectionId,
    pub connection: ConnectionConfig,
    pub oauth: OAuthEndpoints,
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Client credentials and the cached tenant for one connection.
///
/// `tenant_id` is written once, by tenant discovery after the first
/// successful authorization.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub tenant_id: Option<String>,
}

impl ConnectionConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            tenant_id: None,
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// True when both halves of the client credential are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("", "", DEFAULT_REDIRECT_URI)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Identity provider endpoints and requested scopes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Accounting API location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub connections_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connections_url: DEFAULT_CONNECTIONS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Attempts for idempotent requests. POSTs are always sent once.
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS, max_attempts: 3 }
    }
}

/// Local file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub token_path: PathBuf,
    pub settings_path: PathBuf,
    /// Root directory holding one sub-directory of attachments per bill id.
    pub attachments_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(".ledgerbridge/tokens.json"),
            settings_path: PathBuf::from(".ledgerbridge/settings.json"),
            attachments_dir: PathBuf::from("attachments"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}
