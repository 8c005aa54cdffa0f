use std::sync::Arc;

use async_trait::async_trait;
use ledgerbridge_common::auth::TokenLifecycle;
use ledgerbridge_domain::{LedgerBridgeError, Result};

use super::ports::{CredentialSource, SettingsStore};
use crate::accounting_ports::Credentials;

/// Credential source backed by the token lifecycle and the cached tenant.
pub struct TenantCredentials {
    tokens: Arc<dyn TokenLifecycle>,
    settings: Arc<dyn SettingsStore>,
}

impl TenantCredentials {
    pub fn new(tokens: Arc<dyn TokenLifecycle>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { tokens, settings }
    }
}

#[async_trait]
impl CredentialSource for TenantCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        let access_token = self.tokens.get_valid_access_token().await?;
        let tenant_id = self
            .settings
            .load()
            .await?
            .tenant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(LedgerBridgeError::TenantMissing)?;

        Ok(Credentials { access_token, tenant_id })
    }
}
