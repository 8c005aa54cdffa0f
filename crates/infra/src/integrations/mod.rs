//! External service integrations

pub mod xero;

pub use xero::XeroClient;
