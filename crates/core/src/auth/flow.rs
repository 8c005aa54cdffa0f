//! Authorization flow coordinator
//!
//! Builds the consent URL, validates the redirect callback, performs the
//! first code exchange and discovers the tenant to sync into.

use std::fmt;
use std::sync::Arc;

use ledgerbridge_common::auth::{generate_state, validate_state, OAuthConfig, TokenLifecycle};
use ledgerbridge_domain::{LedgerBridgeError, Result, Tenant};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::ports::SettingsStore;
use crate::accounting_ports::TenantDirectory;

/// Consent URL and the state it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Query parameters of the redirect callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn with_code(code: impl Into<String>) -> Self {
        Self { code: Some(code.into()), ..Self::default() }
    }

    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Result of handling one callback request. Never an error: every outcome
/// is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Request carried no code; nothing was sent anywhere.
    NoCode,
    /// The user declined consent.
    Denied { error: String },
    /// State did not match the pending authorization request.
    StateMismatch,
    /// Tokens stored. `tenant` is `None` when discovery found nothing.
    Authorized { tenant: Option<Tenant> },
    /// Code exchange rejected; `message` carries the remote body.
    Failed { message: String },
}

impl CallbackOutcome {
    /// Text for the browser page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCode => "No code provided".to_string(),
            Self::Denied { error } => format!("Authorization was denied: {error}"),
            Self::StateMismatch => {
                "Authorization state did not match. Please start the connection again.".to_string()
            }
            Self::Authorized { .. } => {
                "Authentication successful! You can close this window.".to_string()
            }
            Self::Failed { message } => format!("Failed to authenticate: {message}"),
        }
    }

    /// True once the flow has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authorized { .. } | Self::Failed { .. } | Self::Denied { .. })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

impl fmt::Display for CallbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Coordinates consent, callback and first exchange.
pub struct AuthorizationFlow {
    oauth: OAuthConfig,
    tokens: Arc<dyn TokenLifecycle>,
    tenants: Arc<dyn TenantDirectory>,
    settings: Arc<dyn SettingsStore>,
    pending_state: Mutex<Option<String>>,
}

impl AuthorizationFlow {
    pub fn new(
        oauth: OAuthConfig,
        tokens: Arc<dyn TokenLifecycle>,
        tenants: Arc<dyn TenantDirectory>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self { oauth, tokens, tenants, settings, pending_state: Mutex::new(None) }
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.oauth.redirect_uri
    }

    /// Start an authorization: remember a fresh state and return the URL
    /// the user must open.
    pub async fn begin(&self) -> AuthorizationRequest {
        let state = generate_state();
        let url = self.oauth.authorization_url(&state);
        *self.pending_state.lock().await = Some(state.clone());

        info!(redirect_uri = %self.oauth.redirect_uri, "authorization started");
        AuthorizationRequest { url, state }
    }

    /// Handle a redirect callback.
    ///
    /// A callback that arrives without a pending request (the URL was built
    /// elsewhere) is accepted without a state check. Denials are state
    /// checked like codes, so a stray `?error=` cannot end a pending flow.
    pub async fn handle_callback(&self, params: &CallbackParams) -> CallbackOutcome {
        if let Some(error) = params.error.as_deref() {
            if !self.consume_state(params.state.as_deref()).await {
                return CallbackOutcome::StateMismatch;
            }
            let detail = params.error_description.as_deref().unwrap_or(error);
            warn!(error, "authorization denied at consent screen");
            return CallbackOutcome::Denied { error: detail.to_string() };
        }

        let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
            warn!("callback received without an authorization code");
            return CallbackOutcome::NoCode;
        };

        if !self.consume_state(params.state.as_deref()).await {
            return CallbackOutcome::StateMismatch;
        }

        let exchange = self.tokens.exchange_authorization_code(code, &self.oauth.redirect_uri);
        let record = match exchange.await {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "authorization code exchange failed");
                let message = match err {
                    LedgerBridgeError::AuthExchange { body, .. } => body,
                    other => other.to_string(),
                };
                return CallbackOutcome::Failed { message };
            }
        };

        let tenant = self.discover_tenant(&record.access_token).await;
        info!(tenant = ?tenant.as_ref().map(|t| &t.tenant_name), "authorization completed");
        CallbackOutcome::Authorized { tenant }
    }

    /// Cache the first connected tenant. Failures are logged and yield `None`.
    async fn discover_tenant(&self, access_token: &str) -> Option<Tenant> {
        match self.try_discover_tenant(access_token).await {
            Ok(tenant) => tenant,
            Err(err) => {
                warn!(error = %err, "tenant discovery failed; tenant left unset");
                None
            }
        }
    }

    async fn try_discover_tenant(&self, access_token: &str) -> Result<Option<Tenant>> {
        let connections = self.tenants.connections(access_token).await?;

        let Some(first) = connections.into_iter().next() else {
            warn!("no tenants connected to this authorization");
            return Ok(None);
        };

        self.settings.save_tenant_id(&first.tenant_id).await?;
        info!(tenant_id = %first.tenant_id, tenant_name = %first.tenant_name, "tenant cached");
        Ok(Some(first))
    }

    /// Clear the pending state if `received` matches it. A mismatch keeps
    /// it pending for the genuine redirect.
    async fn consume_state(&self, received: Option<&str>) -> bool {
        let mut pending = self.pending_state.lock().await;
        if let Some(expected) = pending.as_deref() {
            if !validate_state(expected, received.unwrap_or_default()) {
                warn!("callback state does not match the pending request");
                return false;
            }
        }
        pending.take();
        true
    }
}
