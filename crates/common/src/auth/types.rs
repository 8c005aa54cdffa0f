//! OAuth 2.0 types and structures
//!
//! Wire format of the identity server's token endpoint and the client
//! configuration used to talk to it.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ledgerbridge_domain::{ConnectionConfig, LedgerBridgeError, OAuthEndpoints, TokenRecord};
use serde::Deserialize;

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749). `expires_in` is
/// relative; it becomes an absolute expiry when converted into a
/// [`TokenRecord`].
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Record produced by the first exchange. A refresh token is mandatory
    /// here since the connection cannot be kept alive without one.
    pub fn into_record(self, issued_at: DateTime<Utc>) -> Result<TokenRecord, LedgerBridgeError> {
        let refresh_token = self.refresh_token.ok_or_else(|| {
            LedgerBridgeError::InvalidResponse(
                "token response did not include a refresh_token; is offline_access granted?"
                    .into(),
            )
        })?;

        Ok(TokenRecord::issued_at(self.access_token, refresh_token, self.expires_in, issued_at)?
            .with_id_token(self.id_token))
    }

    /// Record produced by a refresh. Fields the server omits carry over from
    /// `previous`.
    pub fn into_refreshed(
        self,
        previous: &TokenRecord,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenRecord, LedgerBridgeError> {
        let refresh_token = self.refresh_token.unwrap_or_else(|| previous.refresh_token.clone());
        let id_token = self.id_token.or_else(|| previous.id_token.clone());

        Ok(TokenRecord::issued_at(self.access_token, refresh_token, self.expires_in, issued_at)?
            .with_id_token(id_token))
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// OAuth configuration for the identity server
///
/// Confidential client: the client secret is sent with every token request
/// in an HTTP Basic header.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        authorize_url: String,
        token_url: String,
        scopes: Vec<String>,
    ) -> Self {
        Self { client_id, client_secret, redirect_uri, authorize_url, token_url, scopes }
    }

    /// Build from persisted connection settings and endpoint configuration.
    #[must_use]
    pub fn from_settings(connection: &ConnectionConfig, endpoints: &OAuthEndpoints) -> Self {
        Self::new(
            connection.client_id.clone(),
            connection.client_secret.clone(),
            connection.redirect_uri.clone(),
            endpoints.authorize_url.clone(),
            endpoints.token_url.clone(),
            endpoints.scopes.clone(),
        )
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// `Basic base64(client_id:client_secret)`
    #[must_use]
    pub fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(credentials))
    }

    /// Consent URL carrying `state` for CSRF protection.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let scope_string = self.scope_string();
        let params = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope_string.as_str()),
            ("state", state),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.authorize_url, query_string)
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}
