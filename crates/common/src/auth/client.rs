//! OAuth 2.0 client for the identity server's token endpoint
//!
//! Handles both grant types used by the lifecycle:
//! - Authorization code exchange
//! - Token refresh
//!
//! Both authenticate the client with an HTTP Basic header and send a
//! form-encoded body. Neither is retried.

use async_trait::async_trait;
use ledgerbridge_domain::{LedgerBridgeError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use tracing::{debug, warn};

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, TokenResponse};
use crate::http::{map_transport_error, read_error_body, HttpClient};

/// Which grant a token request carries; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    fn rejected(self, status: u16, body: String) -> LedgerBridgeError {
        match self {
            Self::AuthorizationCode => LedgerBridgeError::AuthExchange { status, body },
            Self::RefreshToken => LedgerBridgeError::Refresh { status, body },
        }
    }
}

/// OAuth 2.0 confidential client
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: HttpClient,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = HttpClient::builder().max_attempts(1).build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Use a preconfigured HTTP client (timeouts, user agent).
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn token_request(&self, grant: Grant, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let request = self
            .http
            .request(Method::POST, &self.config.token_url)
            .header(AUTHORIZATION, self.config.basic_auth_header())
            .header(ACCEPT, "application/json")
            .form(params);

        let response = self.http.send(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = read_error_body(response).await;
            warn!(?grant, status = status.as_u16(), "token endpoint rejected request");
            return Err(grant.rejected(status.as_u16(), body));
        }

        let token_response: TokenResponse = response.json().await.map_err(|err| {
            if err.is_decode() {
                LedgerBridgeError::InvalidResponse(format!("token response: {err}"))
            } else {
                map_transport_error(err)
            }
        })?;

        debug!(?grant, expires_in = token_response.expires_in, "token endpoint issued tokens");
        Ok(token_response)
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        self.token_request(Grant::AuthorizationCode, &params).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(LedgerBridgeError::Refresh {
                status: 0,
                body: "no refresh token available".into(),
            });
        }

        let params = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        self.token_request(Grant::RefreshToken, &params).await
    }
}
