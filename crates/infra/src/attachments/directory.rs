//! Directory-backed attachment lookup
//!
//! Files for a bill live in `{root}/{bill_id}/`. Every regular file in that
//! directory is an attachment; sub-directories and hidden files are skipped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledgerbridge_core::AttachmentSource;
use ledgerbridge_domain::{AttachmentRef, Bill, LedgerBridgeError, Result};
use tracing::debug;

use crate::errors::to_domain;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Attachment source reading one directory per bill.
#[derive(Debug, Clone)]
pub struct DirectoryAttachmentSource {
    root: PathBuf,
}

impl DirectoryAttachmentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bill_dir(&self, bill: &Bill) -> Result<PathBuf> {
        let id = bill.id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(LedgerBridgeError::InvalidInput(format!(
                "bill id {id:?} cannot be used as a directory name"
            )));
        }
        Ok(self.root.join(id))
    }
}

#[async_trait]
impl AttachmentSource for DirectoryAttachmentSource {
    async fn attachments_for(&self, bill: &Bill) -> Result<Vec<AttachmentRef>> {
        let dir = self.bill_dir(bill)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(to_domain(err)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(to_domain)? {
            let file_type = entry.file_type().await.map_err(to_domain)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_file() && !name.starts_with('.') {
                paths.push((name, entry.path()));
            }
        }
        paths.sort();

        let mut attachments = Vec::with_capacity(paths.len());
        for (name, path) in paths {
            let bytes = tokio::fs::read(&path).await.map_err(to_domain)?;
            attachments.push(AttachmentRef::new(name, mime_for(&path), bytes));
        }

        debug!(bill_id = %bill.id, count = attachments.len(), "attachments loaded");
        Ok(attachments)
    }
}

/// MIME type from the file extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("tif" | "tiff") => "image/tiff",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => FALLBACK_MIME,
    }
}
