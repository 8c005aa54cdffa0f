//! # LedgerBridge App
//!
//! Composition root: wires the infra adapters into the core services and
//! exposes the commands the `ledgerbridge` binary runs.

pub mod commands;
pub mod context;
pub mod logging;

pub use commands::{authorize, push_demo, status, ConnectionStatus};
pub use context::{AppContext, AppTokenManager};
