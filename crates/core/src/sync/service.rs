//! Sync pipeline - core business logic
//!
//! Ordering is contact, then bill, then attachments. Each step records the
//! remote id on the local entity before the next step may run.

use std::sync::Arc;

use ledgerbridge_common::time::{Clock, SystemClock};
use ledgerbridge_domain::{AuditNote, Bill, Contact, LedgerBridgeError, Result};
use tracing::{debug, info, warn};

use super::handles::{PushedBill, SyncedContact};
use super::ports::AttachmentSource;
use crate::accounting_ports::{AccountingClient, Credentials, DraftBill, NewContact};
use crate::auth::ports::CredentialSource;

/// One attachment that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFailure {
    pub filename: String,
    pub error: String,
}

/// Per-file outcome of an attachment upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentUploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<AttachmentFailure>,
    /// Set when the pass could not start (credentials or attachment lookup).
    pub skipped: Option<String>,
}

impl AttachmentUploadReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_none()
    }
}

/// Outcome of a successful bill push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillPushReport {
    pub remote_invoice_id: String,
    /// Invoice id the bill pointed at before this push, if it was a re-push.
    pub previous_invoice_id: Option<String>,
    pub contact_created: bool,
    pub attachments: AttachmentUploadReport,
}

/// Sync service
pub struct SyncService {
    credentials: Arc<dyn CredentialSource>,
    accounting: Arc<dyn AccountingClient>,
    attachments: Arc<dyn AttachmentSource>,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    /// Create a new sync service
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        accounting: Arc<dyn AccountingClient>,
        attachments: Arc<dyn AttachmentSource>,
    ) -> Self {
        Self { credentials, accounting, attachments, clock: Arc::new(SystemClock) }
    }

    /// Use a specific clock for bill dates and audit timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make sure `contact` exists remotely, creating it as a supplier if
    /// needed. No network call when the remote id is already known.
    ///
    /// # Errors
    /// Credential and remote API errors propagate unchanged; the contact is
    /// not modified on failure.
    pub async fn ensure_contact_synced(&self, contact: &mut Contact) -> Result<SyncedContact> {
        if let Some(synced) = SyncedContact::from_contact(contact) {
            debug!(contact_id = %contact.id, "contact already synced");
            return Ok(synced);
        }

        let credentials = self.credentials.credentials().await?;
        self.create_contact(&credentials, contact).await
    }

    /// Push `bill` as a draft payable invoice for `contact`, then upload
    /// its attachments.
    ///
    /// Attachment failures never fail the push; they are recorded as audit
    /// notes and in the returned report.
    ///
    /// # Errors
    /// - `UnsupportedDocumentType` for anything but a supplier bill
    /// - `InvalidInput` if `contact` is not the bill's contact or there are
    ///   no lines
    /// - credential and contact-sync errors unchanged
    /// - `PushFailed` if invoice creation fails; `remote_invoice_id` is left
    ///   as it was
    pub async fn push_bill(&self, bill: &mut Bill, contact: &mut Contact) -> Result<BillPushReport> {
        if !bill.document_type.is_payable_bill() {
            return Err(LedgerBridgeError::UnsupportedDocumentType(bill.document_type));
        }
        if bill.contact_id != contact.id {
            return Err(LedgerBridgeError::InvalidInput(format!(
                "bill {} belongs to contact {}, not {}",
                bill.id, bill.contact_id, contact.id
            )));
        }
        if bill.lines.is_empty() {
            return Err(LedgerBridgeError::InvalidInput(format!("bill {} has no lines", bill.id)));
        }

        let credentials = self.credentials.credentials().await?;

        let contact_created = !contact.is_synced();
        let synced = match SyncedContact::from_contact(contact) {
            Some(synced) => synced,
            None => self.create_contact(&credentials, contact).await?,
        };

        let previous_invoice_id = bill.remote_invoice_id.clone();
        if let Some(previous) = previous_invoice_id.as_deref() {
            warn!(
                bill_id = %bill.id,
                previous_invoice_id = previous,
                "bill already pushed; creating another remote invoice"
            );
        }

        let date = bill.date.unwrap_or_else(|| self.clock.today());
        let draft = DraftBill::new(&synced, &bill.lines, date);

        let remote_invoice_id =
            self.accounting.create_draft_bill(&credentials, &draft).await.map_err(|err| {
                warn!(bill_id = %bill.id, error = %err, "draft bill creation failed");
                LedgerBridgeError::PushFailed { bill_id: bill.id.clone(), source: Box::new(err) }
            })?;

        bill.remote_invoice_id = Some(remote_invoice_id.clone());
        bill.record(AuditNote::info(
            format!("Bill successfully pushed to Xero. Invoice ID: {remote_invoice_id}"),
            self.clock.now(),
        ));
        info!(bill_id = %bill.id, remote_invoice_id = %remote_invoice_id, "bill pushed");

        let attachments = match PushedBill::from_bill(bill) {
            Some(pushed) => self.upload_or_note(&credentials, &pushed, bill).await,
            None => AttachmentUploadReport::default(),
        };

        Ok(BillPushReport { remote_invoice_id, previous_invoice_id, contact_created, attachments })
    }

    /// Upload every attachment of an already-pushed bill.
    ///
    /// Returns an empty report without any call when the bill has no remote
    /// invoice yet. Per-file failures are recorded and the loop continues.
    ///
    /// # Errors
    /// Credential and attachment lookup errors propagate.
    pub async fn upload_all_attachments(&self, bill: &mut Bill) -> Result<AttachmentUploadReport> {
        let Some(pushed) = PushedBill::from_bill(bill) else {
            debug!(bill_id = %bill.id, "bill not pushed; skipping attachments");
            return Ok(AttachmentUploadReport::default());
        };

        let credentials = self.credentials.credentials().await?;
        self.upload_attachments(&credentials, &pushed, bill).await
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &mut Contact,
    ) -> Result<SyncedContact> {
        let remote_id =
            self.accounting.create_contact(credentials, &NewContact::supplier(contact)).await?;

        contact.remote_contact_id = Some(remote_id.clone());
        info!(contact_id = %contact.id, remote_contact_id = %remote_id, "contact created remotely");
        Ok(SyncedContact::new(contact.id.clone(), remote_id))
    }

    async fn upload_or_note(
        &self,
        credentials: &Credentials,
        pushed: &PushedBill,
        bill: &mut Bill,
    ) -> AttachmentUploadReport {
        match self.upload_attachments(credentials, pushed, bill).await {
            Ok(report) => report,
            Err(err) => {
                warn!(bill_id = %bill.id, error = %err, "attachment upload skipped");
                bill.record(AuditNote::warning(
                    format!("Attachments were not uploaded to Xero: {err}"),
                    self.clock.now(),
                ));
                AttachmentUploadReport { skipped: Some(err.to_string()), ..Default::default() }
            }
        }
    }

    async fn upload_attachments(
        &self,
        credentials: &Credentials,
        pushed: &PushedBill,
        bill: &mut Bill,
    ) -> Result<AttachmentUploadReport> {
        let attachments = self.attachments.attachments_for(bill).await?;
        let mut report = AttachmentUploadReport::default();

        for attachment in &attachments {
            match self.accounting.upload_attachment(credentials, pushed, attachment).await {
                Ok(()) => {
                    debug!(bill_id = %bill.id, filename = %attachment.filename, "attachment uploaded");
                    bill.record(AuditNote::info(
                        format!("Attachment '{}' uploaded to Xero.", attachment.filename),
                        self.clock.now(),
                    ));
                    report.uploaded.push(attachment.filename.clone());
                }
                Err(err) => {
                    warn!(
                        bill_id = %bill.id,
                        filename = %attachment.filename,
                        error = %err,
                        "attachment upload failed"
                    );
                    bill.record(AuditNote::warning(
                        format!("Failed to upload attachment '{}' to Xero: {err}", attachment.filename),
                        self.clock.now(),
                    ));
                    report.failed.push(AttachmentFailure {
                        filename: attachment.filename.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            bill_id = %bill.id,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "attachment pass finished"
        );
        Ok(report)
    }
}
