//! Testing utilities and helpers
//!
//! - **[`mocks`]**: In-memory token store and scripted OAuth client
//! - **[`time`]**: Controllable clock for expiry tests
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ledgerbridge_common::auth::TokenManager;
//! use ledgerbridge_common::testing::{MockClock, MockOAuthClient, MockTokenStore};
//! use ledgerbridge_domain::ConnectionId;
//!
//! let manager = TokenManager::new(
//!     Arc::new(MockOAuthClient::new()),
//!     Arc::new(MockTokenStore::new()),
//!     ConnectionId::default(),
//! )
//! .with_clock(Arc::new(MockClock::new()));
//! # let _ = manager;
//! ```

pub mod mocks;
pub mod time;

pub use mocks::{MockOAuthClient, MockTokenStore};
pub use time::MockClock;
