//! Traits for OAuth and token persistence
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (identity server, token storage).

use async_trait::async_trait;
use ledgerbridge_domain::{ConnectionId, Result, TokenRecord};

use super::token_manager::TokenState;
use super::types::TokenResponse;

/// Trait for OAuth client operations
///
/// Abstracts the identity server's token endpoint.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// `AuthExchange` with the raw body when the server rejects the code,
    /// `Network` on transport failure.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse>;

    /// Obtain a new access token with a refresh token
    ///
    /// # Errors
    /// `Refresh` with the raw body when the server rejects the token,
    /// `Network` on transport failure.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// Durable storage of token records keyed by connection.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the record for `connection`, `None` if it was never stored.
    async fn load(&self, connection: &ConnectionId) -> Result<Option<TokenRecord>>;

    /// Insert or overwrite the record for `connection`.
    async fn save(&self, connection: &ConnectionId, record: &TokenRecord) -> Result<()>;
}

/// Token lifecycle as seen by callers that need credentials.
///
/// Implemented by [`super::TokenManager`]; object-safe so services can hold
/// it behind `Arc<dyn TokenLifecycle>`.
#[async_trait]
pub trait TokenLifecycle: Send + Sync {
    /// Exchange a consent code and persist the resulting record.
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord>;

    /// Current access token, refreshed first if it is about to expire.
    async fn get_valid_access_token(&self) -> Result<String>;

    /// Lifecycle state of the stored record.
    async fn state(&self) -> Result<TokenState>;
}
