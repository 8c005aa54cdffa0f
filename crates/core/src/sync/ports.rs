//! Port interfaces for sync operations

use async_trait::async_trait;
use ledgerbridge_domain::{AttachmentRef, Bill, Result};

/// Trait for looking up the files attached to a bill in the host system
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Every attachment currently linked to `bill`, loaded into memory
    async fn attachments_for(&self, bill: &Bill) -> Result<Vec<AttachmentRef>>;
}
