//! Authorization and credentials

pub mod credentials;
pub mod flow;
pub mod ports;

pub use credentials::TenantCredentials;
pub use flow::{AuthorizationFlow, AuthorizationRequest, CallbackOutcome, CallbackParams};
