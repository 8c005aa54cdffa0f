//! Application context - dependency injection container

use std::sync::Arc;

use ledgerbridge_common::auth::{OAuthClient, OAuthConfig, TokenLifecycle, TokenManager};
use ledgerbridge_core::{
    AuthorizationFlow, CredentialSource, SettingsStore, SyncService, TenantCredentials,
};
use ledgerbridge_domain::{AppConfig, LedgerBridgeError, Result};
use ledgerbridge_infra::integrations::xero::build_http_client;
use ledgerbridge_infra::{DirectoryAttachmentSource, FileSettingsStore, FileTokenStore, XeroClient};
use tracing::debug;

/// Token manager as wired in the binary
pub type AppTokenManager = TokenManager<OAuthClient, FileTokenStore>;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AppConfig,
    pub tokens: Arc<AppTokenManager>,
    pub settings: Arc<FileSettingsStore>,
    pub flow: Arc<AuthorizationFlow>,
    pub sync: SyncService,
}

impl AppContext {
    /// Wire every adapter from configuration. No network access happens here.
    ///
    /// # Errors
    /// `Config` when client credentials are missing, or when the HTTP client
    /// cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        if !config.connection.has_credentials() {
            return Err(LedgerBridgeError::Config(
                "client id and secret are required (XERO_CLIENT_ID / XERO_CLIENT_SECRET)".into(),
            ));
        }

        let http = build_http_client(config.http.timeout_secs, config.http.max_attempts)?;
        let oauth_config = OAuthConfig::from_settings(&config.connection, &config.oauth);

        let tokens = Arc::new(TokenManager::new(
            Arc::new(OAuthClient::with_http_client(oauth_config.clone(), http.clone())),
            Arc::new(FileTokenStore::new(&config.storage.token_path)),
            config.connection_id.clone(),
        ));
        let settings = Arc::new(FileSettingsStore::new(
            &config.storage.settings_path,
            config.connection.clone(),
        ));
        let xero = Arc::new(
            XeroClient::new(http)
                .with_api_base(config.api.base_url.clone())
                .with_connections_url(config.api.connections_url.clone()),
        );

        let lifecycle: Arc<dyn TokenLifecycle> = tokens.clone();
        let settings_port: Arc<dyn SettingsStore> = settings.clone();

        let flow = Arc::new(AuthorizationFlow::new(
            oauth_config,
            lifecycle.clone(),
            xero.clone(),
            settings_port.clone(),
        ));

        let credentials: Arc<dyn CredentialSource> =
            Arc::new(TenantCredentials::new(lifecycle, settings_port));
        let sync = SyncService::new(
            credentials,
            xero,
            Arc::new(DirectoryAttachmentSource::new(&config.storage.attachments_dir)),
        );

        debug!(connection = %config.connection_id, "application context ready");
        Ok(Self { config, tokens, settings, flow, sync })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config_in(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.connection.client_id = "client".into();
        config.connection.client_secret = "secret".into();
        config.storage.token_path = dir.path().join("tokens.json");
        config.storage.settings_path = dir.path().join("settings.json");
        config.storage.attachments_dir = dir.path().join("attachments");
        config
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = AppContext::new(AppConfig::default()).err().unwrap();
        assert!(matches!(err, LedgerBridgeError::Config(_)));
    }

    #[test]
    fn context_builds_from_config() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::new(config_in(&dir)).unwrap();

        assert_eq!(ctx.flow.redirect_uri(), "http://localhost:8069/xero_callback");
        assert_eq!(ctx.tokens.connection().as_str(), "default");
    }
}
