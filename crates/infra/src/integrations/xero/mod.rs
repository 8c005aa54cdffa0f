//! Xero accounting integration
//!
//! Implements the core accounting and tenant-directory ports over the
//! Xero REST API.

pub mod client;
pub mod types;

pub use client::{build_http_client, XeroClient};
