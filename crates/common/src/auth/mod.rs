//! OAuth 2.0 token lifecycle
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  exchange, refresh-before-expiry, single flight
//! └────────┬────────┘
//!          │
//!          ├──► OAuthClient   (token endpoint, Basic client auth)
//!          │
//!          └──► TokenStore    (durable record per connection)
//! ```
//!
//! The consent URL and CSRF state live here too ([`OAuthConfig::authorization_url`],
//! [`generate_state`]); the callback handling that ties them together is in
//! the core crate.

pub mod client;
pub mod state;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::OAuthClient;
pub use state::{generate_state, validate_state};
pub use token_manager::{TokenManager, TokenState};
pub use traits::{OAuthClientTrait, TokenLifecycle, TokenStore};
pub use types::{OAuthConfig, TokenResponse};
