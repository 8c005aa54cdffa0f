//! # LedgerBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the accounting API, tenant lookup,
//!   settings and attachment storage
//! - The authorization flow coordinator
//! - The contact → bill → attachment sync pipeline
//!
//! ## Architecture Principles
//! - Depends on `ledgerbridge-common` for the token lifecycle
//! - No HTTP or filesystem code
//! - All external dependencies via traits

pub mod accounting_ports;
pub mod auth;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use accounting_ports::{AccountingClient, Credentials, DraftBill, NewContact, TenantDirectory};
pub use auth::ports::{CredentialSource, SettingsStore};
pub use auth::{
    AuthorizationFlow, AuthorizationRequest, CallbackOutcome, CallbackParams, TenantCredentials,
};
pub use sync::handles::{PushedBill, SyncedContact};
pub use sync::ports::AttachmentSource;
pub use sync::{AttachmentFailure, AttachmentUploadReport, BillPushReport, SyncService};
