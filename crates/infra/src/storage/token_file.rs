//! File-backed token store
//!
//! One JSON object maps connection ids to token records. Writes go through
//! a sibling temp file and a rename so a crash never leaves a half-written
//! store. On Unix the file is created with mode `0600`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledgerbridge_common::auth::TokenStore;
use ledgerbridge_domain::{ConnectionId, Result, TokenRecord};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::to_domain;

type RecordMap = BTreeMap<ConnectionId, TokenRecord>;

/// Token store persisted to a single JSON file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<RecordMap> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(RecordMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(to_domain),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(RecordMap::new()),
            Err(err) => Err(to_domain(err)),
        }
    }

    async fn write_all(&self, records: &RecordMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(to_domain)?;
        }

        let data = serde_json::to_vec_pretty(records).map_err(to_domain)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, &data).await?;

        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(to_domain(err));
        }
        Ok(())
    }
}

/// Write `data` to a fresh file that is private from the moment it exists.
async fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    // A leftover from an interrupted write may carry wider permissions.
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(to_domain(err)),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await.map_err(to_domain)?;
    let written = async {
        file.write_all(data).await?;
        file.sync_all().await
    }
    .await;

    if let Err(err) = written {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(to_domain(err));
    }
    Ok(())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, connection: &ConnectionId) -> Result<Option<TokenRecord>> {
        Ok(self.read_all().await?.remove(connection))
    }

    async fn save(&self, connection: &ConnectionId, record: &TokenRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        records.insert(connection.clone(), record.clone());
        self.write_all(&records).await?;

        debug!(connection = %connection, path = %self.path.display(), "token record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ledgerbridge_domain::LedgerBridgeError;
    use tempfile::TempDir;

    use super::*;

    fn record(access: &str) -> TokenRecord {
        TokenRecord::new(
            access,
            format!("refresh-{access}"),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).single().unwrap(),
        )
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        assert_eq!(store.load(&ConnectionId::default()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_per_connection() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/tokens.json"));
        let main = ConnectionId::default();
        let other = ConnectionId::new("second-org");

        store.save(&main, &record("A1")).await.unwrap();
        store.save(&other, &record("B1")).await.unwrap();
        store.save(&main, &record("A2")).await.unwrap();

        assert_eq!(store.load(&main).await.unwrap(), Some(record("A2")));
        assert_eq!(store.load(&other).await.unwrap(), Some(record("B1")));

        let reopened = FileTokenStore::new(store.path());
        assert_eq!(reopened.load(&other).await.unwrap(), Some(record("B1")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn store_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store.save(&ConnectionId::default(), &record("A1")).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_temp_file_does_not_leak_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        let tmp = dir.path().join("tokens.json.tmp");
        std::fs::write(&tmp, "leftover").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&ConnectionId::default(), &record("A1")).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        // A non-empty directory in the way makes the rename fail.
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let store = FileTokenStore::new(&path);

        let err = store.write_all(&RecordMap::new()).await.unwrap_err();

        assert!(matches!(err, LedgerBridgeError::Storage(_)));
        assert!(!dir.path().join("tokens.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileTokenStore::new(&path).load(&ConnectionId::default()).await.unwrap_err();

        assert!(matches!(err, LedgerBridgeError::Storage(_)));
    }
}
