//! # LedgerBridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The Xero REST adapter (contacts, draft bills, attachments, connections)
//! - File-backed token and settings stores
//! - Directory-backed attachment lookup
//! - The loopback callback listener for first-time authorization
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `ledgerbridge-core` and `ledgerbridge-common`
//! - Contains all "impure" code (network, filesystem)

pub mod attachments;
pub mod auth;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod storage;

// Re-export commonly used items
pub use attachments::DirectoryAttachmentSource;
pub use auth::CallbackServer;
pub use errors::InfraError;
pub use integrations::XeroClient;
pub use storage::{FileSettingsStore, FileTokenStore};
