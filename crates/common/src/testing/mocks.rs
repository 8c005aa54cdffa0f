//! Mock implementations of the auth traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ledgerbridge_domain::{ConnectionId, LedgerBridgeError, Result, TokenRecord};

use crate::auth::{OAuthClientTrait, TokenResponse, TokenStore};

// Type aliases to reduce complexity
type RecordMap = Arc<Mutex<HashMap<ConnectionId, TokenRecord>>>;
type ScriptedResponses = Arc<Mutex<VecDeque<Result<TokenResponse>>>>;

/// In-memory token store
///
/// Counts saves so tests can assert that a failed refresh never wrote.
#[derive(Debug, Clone, Default)]
pub struct MockTokenStore {
    records: RecordMap,
    saves: Arc<AtomicUsize>,
}

impl MockTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a save.
    pub fn insert(&self, connection: &ConnectionId, record: TokenRecord) {
        // SAFETY: Mutex poisoning is acceptable in test mocks - if a test panics,
        // the entire test fails anyway
        self.records.lock().unwrap().insert(connection.clone(), record);
    }

    #[must_use]
    pub fn get(&self, connection: &ConnectionId) -> Option<TokenRecord> {
        self.records.lock().unwrap().get(connection).cloned()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MockTokenStore {
    async fn load(&self, connection: &ConnectionId) -> Result<Option<TokenRecord>> {
        Ok(self.get(connection))
    }

    async fn save(&self, connection: &ConnectionId, record: &TokenRecord) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.insert(connection, record.clone());
        Ok(())
    }
}

/// Scripted OAuth client
///
/// Responses are queued per grant and consumed in order. An empty queue
/// yields an `Internal` error so unexpected calls fail loudly.
#[derive(Debug, Clone, Default)]
pub struct MockOAuthClient {
    exchange_responses: ScriptedResponses,
    refresh_responses: ScriptedResponses,
    exchanged_codes: Arc<Mutex<Vec<(String, String)>>>,
    refreshed_with: Arc<Mutex<Vec<String>>>,
    refresh_delay: Option<Duration>,
}

impl MockOAuthClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every refresh, to widen race windows in concurrency tests.
    #[must_use]
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    /// Convenience token response.
    #[must_use]
    pub fn response(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: access.to_string(),
            refresh_token: refresh.map(ToOwned::to_owned),
            id_token: None,
            token_type: Some("Bearer".to_string()),
            expires_in,
            scope: None,
        }
    }

    pub fn push_exchange(&self, response: Result<TokenResponse>) {
        self.exchange_responses.lock().unwrap().push_back(response);
    }

    pub fn push_refresh(&self, response: Result<TokenResponse>) {
        self.refresh_responses.lock().unwrap().push_back(response);
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchanged_codes.lock().unwrap().len()
    }

    /// `(code, redirect_uri)` pairs received, in order.
    #[must_use]
    pub fn exchanged_codes(&self) -> Vec<(String, String)> {
        self.exchanged_codes.lock().unwrap().clone()
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refreshed_with.lock().unwrap().len()
    }

    /// Refresh tokens received, in order.
    #[must_use]
    pub fn refreshed_with(&self) -> Vec<String> {
        self.refreshed_with.lock().unwrap().clone()
    }

    fn next(queue: &ScriptedResponses, grant: &str) -> Result<TokenResponse> {
        queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(LedgerBridgeError::Internal(format!("no scripted {grant} response")))
        })
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        self.exchanged_codes.lock().unwrap().push((code.to_string(), redirect_uri.to_string()));
        Self::next(&self.exchange_responses, "exchange")
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.refreshed_with.lock().unwrap().push(refresh_token.to_string());
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.refresh_responses, "refresh")
    }
}
