//! # LedgerBridge Domain
//!
//! Business domain types and models for LedgerBridge.
//!
//! This crate contains:
//! - Accounting entities (contacts, bills, attachments) and token records
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Remote endpoint and protocol constants
//!
//! ## Architecture
//! - No dependencies on other LedgerBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
