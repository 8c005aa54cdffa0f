//! Token manager with on-demand refresh
//!
//! Manages the OAuth token lifecycle for one connection:
//! - First authorization-code exchange and persistence
//! - Refresh when the access token is within the refresh margin of expiry
//! - Single-flight refresh under concurrent callers
//!
//! There is no background task. Every caller that needs a token goes
//! through [`TokenManager::get_valid_access_token`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ledgerbridge_domain::constants::TOKEN_REFRESH_MARGIN_SECS;
use ledgerbridge_domain::{ConnectionId, LedgerBridgeError, Result, TokenRecord};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::traits::{OAuthClientTrait, TokenLifecycle, TokenStore};
use crate::time::{Clock, SystemClock};

/// Lifecycle state of the stored token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No record stored yet.
    Unauthenticated,
    /// Usable without a refresh.
    Valid { expires_at: DateTime<Utc> },
    /// Within the refresh margin (or past expiry); the next read refreshes.
    Expiring { expires_at: DateTime<Utc> },
}

impl TokenState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

/// Token manager with refresh-before-expiry
///
/// 1. Persists records through a [`TokenStore`] keyed by connection
/// 2. Refreshes synchronously when `now >= expires_at - margin`
/// 3. Serializes load/refresh/store so concurrent callers share one refresh
pub struct TokenManager<C, S>
where
    C: OAuthClientTrait + ?Sized + 'static,
    S: TokenStore + ?Sized + 'static,
{
    oauth_client: Arc<C>,
    store: Arc<S>,
    connection: ConnectionId,
    refresh_margin: Duration,
    clock: Arc<dyn Clock>,
    // Held across load, refresh and save.
    gate: Mutex<()>,
}

impl<C, S> TokenManager<C, S>
where
    C: OAuthClientTrait + ?Sized + 'static,
    S: TokenStore + ?Sized + 'static,
{
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `oauth_client` - OAuth client for exchange and refresh
    /// * `store` - Token persistence
    /// * `connection` - Key of the record this manager owns
    #[must_use]
    pub fn new(oauth_client: Arc<C>, store: Arc<S>, connection: ConnectionId) -> Self {
        Self {
            oauth_client,
            store,
            connection,
            refresh_margin: Duration::seconds(TOKEN_REFRESH_MARGIN_SECS),
            clock: Arc::new(SystemClock),
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    #[must_use]
    pub fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    /// Exchange an authorization code and upsert the connection's record.
    ///
    /// # Errors
    /// `AuthExchange` if the identity server rejects the code. Nothing is
    /// stored in that case.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord> {
        let issued_at = self.clock.now();
        let response = self.oauth_client.exchange_code(code, redirect_uri).await?;
        let record = response.into_record(issued_at)?;

        let _guard = self.gate.lock().await;
        self.store.save(&self.connection, &record).await?;

        info!(
            connection = %self.connection,
            expires_at = %record.expires_at,
            "authorization code exchanged; token record stored"
        );
        Ok(record)
    }

    /// Get a usable access token, refreshing first if it is near expiry.
    ///
    /// This is the primary method for retrieving access tokens.
    ///
    /// # Errors
    /// - `NotAuthenticated` if no record exists
    /// - `Refresh` if a needed refresh is rejected
    pub async fn get_valid_access_token(&self) -> Result<String> {
        let _guard = self.gate.lock().await;

        let record = self
            .store
            .load(&self.connection)
            .await?
            .ok_or(LedgerBridgeError::NotAuthenticated)?;

        let now = self.clock.now();
        if record.needs_refresh(now, self.refresh_margin) {
            debug!(
                connection = %self.connection,
                seconds_left = record.seconds_until_expiry(now),
                "access token within refresh margin"
            );
            return self.refresh_locked(&record).await;
        }

        Ok(record.access_token)
    }

    /// Refresh `record` explicitly and return the new access token.
    ///
    /// If another caller already rotated the stored record, its still-valid
    /// access token is returned instead of spending the rotated refresh
    /// token a second time.
    ///
    /// # Errors
    /// `Refresh` on rejection. The stored record is left untouched and the
    /// call is not retried.
    pub async fn refresh(&self, record: &TokenRecord) -> Result<String> {
        let _guard = self.gate.lock().await;

        let current = self.store.load(&self.connection).await?;
        if let Some(current) = current {
            if current.refresh_token != record.refresh_token
                && !current.needs_refresh(self.clock.now(), self.refresh_margin)
            {
                debug!(connection = %self.connection, "token already rotated by another caller");
                return Ok(current.access_token);
            }
            return self.refresh_locked(&current).await;
        }

        self.refresh_locked(record).await
    }

    /// Lifecycle state of the stored record, without refreshing.
    ///
    /// # Errors
    /// Returns error if the token store cannot be read
    pub async fn state(&self) -> Result<TokenState> {
        let record = self.store.load(&self.connection).await?;
        let now = self.clock.now();

        Ok(match record {
            None => TokenState::Unauthenticated,
            Some(record) if record.needs_refresh(now, self.refresh_margin) => {
                TokenState::Expiring { expires_at: record.expires_at }
            }
            Some(record) => TokenState::Valid { expires_at: record.expires_at },
        })
    }

    // Caller must hold `gate`.
    async fn refresh_locked(&self, record: &TokenRecord) -> Result<String> {
        let issued_at = self.clock.now();

        let response = match self.oauth_client.refresh(&record.refresh_token).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    connection = %self.connection,
                    error = %err,
                    "token refresh failed; stored record left unchanged"
                );
                return Err(err);
            }
        };

        let refreshed = response.into_refreshed(record, issued_at)?;
        self.store.save(&self.connection, &refreshed).await?;

        info!(
            connection = %self.connection,
            expires_at = %refreshed.expires_at,
            "access token refreshed"
        );
        Ok(refreshed.access_token)
    }
}

#[async_trait]
impl<C, S> TokenLifecycle for TokenManager<C, S>
where
    C: OAuthClientTrait + ?Sized + 'static,
    S: TokenStore + ?Sized + 'static,
{
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord> {
        Self::exchange_authorization_code(self, code, redirect_uri).await
    }

    async fn get_valid_access_token(&self) -> Result<String> {
        Self::get_valid_access_token(self).await
    }

    async fn state(&self) -> Result<TokenState> {
        Self::state(self).await
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    //! Unit tests for auth::token_manager.
    use chrono::TimeZone;

    use super::*;
    use crate::testing::{MockClock, MockOAuthClient, MockTokenStore};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap()
    }

    fn create_test_manager(
        oauth: Arc<MockOAuthClient>,
        store: Arc<MockTokenStore>,
        clock: Arc<MockClock>,
    ) -> TokenManager<MockOAuthClient, MockTokenStore> {
        TokenManager::new(oauth, store, ConnectionId::default()).with_clock(clock)
    }

    /// Validates the not authenticated error scenario.
    ///
    /// Assertions:
    /// - Ensures `NotAuthenticated` is returned with an empty store.
    /// - Ensures no refresh was attempted.
    #[tokio::test]
    async fn test_not_authenticated_error() {
        let oauth = Arc::new(MockOAuthClient::new());
        let manager = create_test_manager(
            oauth.clone(),
            Arc::new(MockTokenStore::new()),
            Arc::new(MockClock::at(t0())),
        );

        let result = manager.get_valid_access_token().await;
        assert!(matches!(result, Err(LedgerBridgeError::NotAuthenticated)));
        assert_eq!(oauth.refresh_calls(), 0);
    }

    /// Validates the valid token scenario.
    ///
    /// Assertions:
    /// - Confirms the stored access token is returned as-is.
    /// - Confirms the OAuth client was never called.
    #[tokio::test]
    async fn test_valid_token_returned_without_refresh() {
        let oauth = Arc::new(MockOAuthClient::new());
        let store = Arc::new(MockTokenStore::new());
        store.insert(&ConnectionId::default(), TokenRecord::issued_at("A1", "R1", 1800, t0()).unwrap());
        let manager = create_test_manager(oauth.clone(), store, Arc::new(MockClock::at(t0())));

        assert_eq!(manager.get_valid_access_token().await.unwrap(), "A1");
        assert_eq!(oauth.refresh_calls(), 0);
        assert_eq!(oauth.exchange_calls(), 0);
    }

    /// Validates the expiring token scenario.
    ///
    /// Assertions:
    /// - Confirms the refreshed token is returned.
    /// - Confirms the stored record holds the rotated pair and new expiry.
    #[tokio::test]
    async fn test_expiring_token_is_refreshed_and_stored() {
        let oauth = Arc::new(MockOAuthClient::new());
        oauth.push_refresh(Ok(MockOAuthClient::response("A2", Some("R2"), 1800)));
        let store = Arc::new(MockTokenStore::new());
        store.insert(&ConnectionId::default(), TokenRecord::issued_at("A1", "R1", 30, t0()).unwrap());
        let clock = Arc::new(MockClock::at(t0()));
        let manager = create_test_manager(oauth.clone(), store.clone(), clock);

        assert_eq!(manager.get_valid_access_token().await.unwrap(), "A2");

        let stored = store.get(&ConnectionId::default()).unwrap();
        assert_eq!(stored.refresh_token, "R2");
        assert_eq!(stored.expires_at, t0() + Duration::seconds(1800));
        assert_eq!(oauth.refreshed_with(), vec!["R1".to_string()]);
    }

    /// Validates the state reporting scenario.
    ///
    /// Assertions:
    /// - Unauthenticated, then Valid, then Expiring as time advances.
    #[tokio::test]
    async fn test_state_transitions_with_clock() {
        let store = Arc::new(MockTokenStore::new());
        let clock = Arc::new(MockClock::at(t0()));
        let manager =
            create_test_manager(Arc::new(MockOAuthClient::new()), store.clone(), clock.clone());

        assert_eq!(manager.state().await.unwrap(), TokenState::Unauthenticated);

        let record = TokenRecord::issued_at("A1", "R1", 1800, t0()).unwrap();
        let expires_at = record.expires_at;
        store.insert(&ConnectionId::default(), record);
        assert_eq!(manager.state().await.unwrap(), TokenState::Valid { expires_at });

        clock.advance(Duration::seconds(1740));
        assert_eq!(manager.state().await.unwrap(), TokenState::Expiring { expires_at });
    }

    /// Validates the rotated-elsewhere scenario for explicit refresh.
    ///
    /// Assertions:
    /// - A stale record argument does not trigger a second refresh.
    #[tokio::test]
    async fn test_explicit_refresh_skips_already_rotated_record() {
        let oauth = Arc::new(MockOAuthClient::new());
        let store = Arc::new(MockTokenStore::new());
        let stale = TokenRecord::issued_at("A1", "R1", 30, t0()).unwrap();
        store.insert(&ConnectionId::default(), TokenRecord::issued_at("A2", "R2", 1800, t0()).unwrap());
        let manager = create_test_manager(oauth.clone(), store, Arc::new(MockClock::at(t0())));

        assert_eq!(manager.refresh(&stale).await.unwrap(), "A2");
        assert_eq!(oauth.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_margin_default() {
        let manager = create_test_manager(
            Arc::new(MockOAuthClient::new()),
            Arc::new(MockTokenStore::new()),
            Arc::new(MockClock::at(t0())),
        );
        assert_eq!(manager.refresh_margin(), Duration::seconds(60));
    }
}
