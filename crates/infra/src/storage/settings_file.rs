//! File-backed connection settings
//!
//! Client credentials come from configuration and are never written back.
//! Only the discovered tenant is persisted, in a small JSON file next to the
//! token store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledgerbridge_core::SettingsStore;
use ledgerbridge_domain::{ConnectionConfig, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::to_domain;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
}

/// Settings store layering a persisted tenant over configured credentials.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    base: ConnectionConfig,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, base: ConnectionConfig) -> Self {
        Self { path: path.into(), base, write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<PersistedSettings> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(PersistedSettings::default()),
            Ok(raw) => serde_json::from_str(&raw).map_err(to_domain),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(PersistedSettings::default())
            }
            Err(err) => Err(to_domain(err)),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<ConnectionConfig> {
        let persisted = self.read().await?;
        let mut config = self.base.clone();
        if let Some(tenant_id) = persisted.tenant_id {
            debug!(tenant_id = %tenant_id, "using persisted tenant");
            config.tenant_id = Some(tenant_id);
        }
        Ok(config)
    }

    async fn save_tenant_id(&self, tenant_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut persisted = self.read().await?;
        persisted.tenant_id = Some(tenant_id.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(to_domain)?;
        }
        let data = serde_json::to_vec_pretty(&persisted).map_err(to_domain)?;
        tokio::fs::write(&self.path, data).await.map_err(to_domain)?;

        info!(tenant_id = %tenant_id, "tenant id persisted");
        Ok(())
    }
}
