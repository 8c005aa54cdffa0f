//! Port interfaces for connection settings and credentials

use async_trait::async_trait;
use ledgerbridge_domain::{ConnectionConfig, Result};

use crate::accounting_ports::Credentials;

/// Trait for reading and updating persisted connection settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current connection settings
    async fn load(&self) -> Result<ConnectionConfig>;

    /// Persist the tenant discovered after authorization
    async fn save_tenant_id(&self, tenant_id: &str) -> Result<()>;
}

/// Supplies credentials for accounting API calls
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// A valid access token and the tenant it is scoped to
    async fn credentials(&self) -> Result<Credentials>;
}
