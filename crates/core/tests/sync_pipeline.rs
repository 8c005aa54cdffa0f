//! Integration tests for the sync pipeline
//!
//! Runs `SyncService` against recording mocks for the accounting API,
//! credentials and attachment lookup.

mod support;

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use ledgerbridge_common::testing::MockClock;
use ledgerbridge_core::SyncService;
use ledgerbridge_domain::{
    AuditLevel, Bill, BillLine, Contact, DocumentType, LedgerBridgeError,
};
use support::{
    AccountingCall, MockAccountingClient, MockCredentialSource, StaticAttachmentSource,
};

struct Harness {
    service: SyncService,
    accounting: MockAccountingClient,
    credentials: MockCredentialSource,
}

fn harness_with(credentials: MockCredentialSource, attachments: StaticAttachmentSource) -> Harness {
    let accounting = MockAccountingClient::new();
    let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).single().unwrap());
    let service = SyncService::new(
        Arc::new(credentials.clone()),
        Arc::new(accounting.clone()),
        Arc::new(attachments),
    )
    .with_clock(Arc::new(clock));

    Harness { service, accounting, credentials }
}

fn harness() -> Harness {
    harness_with(MockCredentialSource::valid(), StaticAttachmentSource::empty())
}

fn supplier() -> Contact {
    Contact::new("P-7", "Acme Supplies").with_email("ap@acme.test")
}

fn bill(document_type: DocumentType) -> Bill {
    Bill::new("BILL-1", document_type, "P-7").with_line(BillLine::new("Printer paper", 4.0, 9.5))
}

/// Validates that an already-synced contact is returned without any call.
///
/// Assertions:
/// - Handle carries the existing remote id
/// - No credentials fetched, no accounting calls
#[tokio::test]
async fn synced_contact_makes_no_calls() {
    let h = harness();
    let mut contact = supplier().with_remote_id("X-CONTACT-1");

    let synced = h.service.ensure_contact_synced(&mut contact).await.unwrap();

    assert_eq!(synced.remote_id(), "X-CONTACT-1");
    assert_eq!(h.accounting.call_count(), 0);
    assert_eq!(h.credentials.calls(), 0);
}

/// Validates that an unsynced contact is created as a supplier.
///
/// Assertions:
/// - One create-contact call scoped to the tenant, marked as supplier
/// - Remote id stored on the contact
#[tokio::test]
async fn unsynced_contact_is_created_as_supplier() {
    let h = harness();
    let mut contact = supplier();

    let synced = h.service.ensure_contact_synced(&mut contact).await.unwrap();

    assert_eq!(contact.remote_contact_id.as_deref(), Some(synced.remote_id()));
    match h.accounting.calls().as_slice() {
        [AccountingCall::CreateContact { tenant_id, contact: sent }] => {
            assert_eq!(tenant_id, "tenant-1");
            assert_eq!(sent.name, "Acme Supplies");
            assert_eq!(sent.email.as_deref(), Some("ap@acme.test"));
            assert!(sent.is_supplier);
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

/// Validates that syncing the same contact twice creates it only once.
///
/// Assertions:
/// - Exactly one create-contact call
/// - Both handles carry the same remote id
/// - Credentials fetched only for the first sync
#[tokio::test]
async fn repeated_sync_creates_contact_once() {
    let h = harness();
    let mut contact = supplier();

    let first = h.service.ensure_contact_synced(&mut contact).await.unwrap().remote_id().to_string();
    let second = h.service.ensure_contact_synced(&mut contact).await.unwrap().remote_id().to_string();

    assert_eq!(first, second);
    assert_eq!(contact.remote_contact_id.as_deref(), Some(first.as_str()));
    assert_eq!(h.accounting.call_count(), 1);
    assert!(matches!(h.accounting.calls().as_slice(), [AccountingCall::CreateContact { .. }]));
    assert_eq!(h.credentials.calls(), 1);
}

/// Validates that contact creation errors propagate and leave the contact
/// untouched.
#[tokio::test]
async fn contact_creation_failure_leaves_contact_unsynced() {
    let h = harness();
    h.accounting.fail_next_contact(LedgerBridgeError::remote(400, "A validation exception occurred"));
    let mut contact = supplier();

    let err = h.service.ensure_contact_synced(&mut contact).await.unwrap_err();

    assert!(matches!(err, LedgerBridgeError::RemoteApi { status: 400, .. }));
    assert!(contact.remote_contact_id.is_none());
}

/// Validates the full happy path for a bill with an unsynced contact.
///
/// Assertions:
/// - Contact created first, then the draft bill against the new contact id
/// - Bill date falls back to today's date from the clock
/// - Remote invoice id and success note recorded on the bill
#[tokio::test]
async fn push_bill_creates_contact_then_draft() {
    let h = harness();
    let mut contact = supplier();
    let mut bill = bill(DocumentType::SupplierBill);

    let report = h.service.push_bill(&mut bill, &mut contact).await.unwrap();

    assert!(report.contact_created);
    assert_eq!(report.previous_invoice_id, None);
    assert_eq!(bill.remote_invoice_id.as_deref(), Some(report.remote_invoice_id.as_str()));

    let calls = h.accounting.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], AccountingCall::CreateContact { .. }));

    let drafts = h.accounting.draft_bills();
    let draft = &drafts[0];
    assert_eq!(Some(draft.remote_contact_id()), contact.remote_contact_id.as_deref());
    assert_eq!(draft.date(), NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
    assert_eq!(draft.lines()[0].description, "Printer paper");
    assert_eq!(draft.lines()[0].account_code, "429");

    let note = bill.audit_log.last().unwrap();
    assert_eq!(note.level, AuditLevel::Info);
    assert_eq!(
        note.message,
        format!("Bill successfully pushed to Xero. Invoice ID: {}", report.remote_invoice_id)
    );
}

/// Validates that an explicit bill date is sent unchanged.
#[tokio::test]
async fn push_bill_keeps_explicit_date() {
    let h = harness();
    let mut contact = supplier().with_remote_id("X-CONTACT-1");
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let mut bill = bill(DocumentType::SupplierBill).with_date(date);

    let report = h.service.push_bill(&mut bill, &mut contact).await.unwrap();

    assert!(!report.contact_created);
    assert_eq!(h.accounting.draft_bills()[0].date(), date);
    assert_eq!(h.accounting.draft_bills()[0].remote_contact_id(), "X-CONTACT-1");
}

/// Validates that non-bill document types are rejected before any I/O.
///
/// Assertions:
/// - Every non-payable type returns `UnsupportedDocumentType`
/// - Zero accounting calls, zero credential lookups
/// - Bill and contact unchanged
#[tokio::test]
async fn unsupported_document_types_make_no_calls() {
    for document_type in [
        DocumentType::SupplierRefund,
        DocumentType::CustomerInvoice,
        DocumentType::CustomerRefund,
        DocumentType::JournalEntry,
    ] {
        let h = harness();
        let mut contact = supplier();
        let mut bill = bill(document_type);
        let before = bill.clone();

        let err = h.service.push_bill(&mut bill, &mut contact).await.unwrap_err();

        assert!(matches!(err, LedgerBridgeError::UnsupportedDocumentType(t) if t == document_type));
        assert_eq!(h.accounting.call_count(), 0);
        assert_eq!(h.credentials.calls(), 0);
        assert_eq!(bill, before);
        assert!(contact.remote_contact_id.is_none());
    }
}

/// Validates the input checks that run before any I/O.
#[tokio::test]
async fn push_bill_rejects_mismatched_contact_and_empty_lines() {
    let h = harness();

    let mut other = Contact::new("P-8", "Someone Else");
    let mut bill = bill(DocumentType::SupplierBill);
    let err = h.service.push_bill(&mut bill, &mut other).await.unwrap_err();
    assert!(matches!(err, LedgerBridgeError::InvalidInput(_)));

    let mut contact = supplier();
    let mut empty = Bill::new("BILL-2", DocumentType::SupplierBill, "P-7");
    let err = h.service.push_bill(&mut empty, &mut contact).await.unwrap_err();
    assert!(matches!(err, LedgerBridgeError::InvalidInput(_)));

    assert_eq!(h.accounting.call_count(), 0);
}

/// Validates failure isolation when the bill call fails after the contact
/// was created.
///
/// Assertions:
/// - `PushFailed` wraps the remote error and names the bill
/// - Contact keeps its new remote id
/// - Bill has no remote invoice id and no new notes
#[tokio::test]
async fn bill_failure_after_contact_creation_keeps_contact_id() {
    let h = harness();
    h.accounting.fail_next_bill(LedgerBridgeError::remote(400, "AccountCode is invalid"));
    let mut contact = supplier();
    let mut bill = bill(DocumentType::SupplierBill);

    let err = h.service.push_bill(&mut bill, &mut contact).await.unwrap_err();

    match err {
        LedgerBridgeError::PushFailed { bill_id, source } => {
            assert_eq!(bill_id, "BILL-1");
            assert!(
                matches!(*source, LedgerBridgeError::RemoteApi { status: 400, ref body } if body == "AccountCode is invalid")
            );
        }
        other => panic!("expected PushFailed, got {other:?}"),
    }
    assert!(contact.remote_contact_id.is_some());
    assert!(bill.remote_invoice_id.is_none());
    assert!(bill.audit_log.is_empty());
}

/// Validates that credential errors surface before any accounting call.
#[tokio::test]
async fn missing_tenant_stops_push() {
    let h = harness_with(
        MockCredentialSource::failing(LedgerBridgeError::TenantMissing),
        StaticAttachmentSource::empty(),
    );
    let mut contact = supplier();
    let mut bill = bill(DocumentType::SupplierBill);

    let err = h.service.push_bill(&mut bill, &mut contact).await.unwrap_err();

    assert!(matches!(err, LedgerBridgeError::TenantMissing));
    assert!(err.is_auth_error());
    assert_eq!(h.accounting.call_count(), 0);
}

/// Validates that re-pushing creates a second invoice and reports the old id.
#[tokio::test]
async fn repush_creates_new_invoice() {
    let h = harness();
    let mut contact = supplier().with_remote_id("X-CONTACT-1");
    let mut bill = bill(DocumentType::SupplierBill);

    let first = h.service.push_bill(&mut bill, &mut contact).await.unwrap();
    let second = h.service.push_bill(&mut bill, &mut contact).await.unwrap();

    assert_ne!(first.remote_invoice_id, second.remote_invoice_id);
    assert_eq!(second.previous_invoice_id.as_deref(), Some(first.remote_invoice_id.as_str()));
    assert_eq!(bill.remote_invoice_id.as_deref(), Some(second.remote_invoice_id.as_str()));
    assert_eq!(h.accounting.draft_bills().len(), 2);
}

/// Validates that one failing attachment does not stop the others or fail
/// the push.
///
/// Assertions:
/// - Push succeeds and the bill keeps its remote id
/// - Every file is attempted, in order
/// - Success and failure notes recorded per file
#[tokio::test]
async fn partial_attachment_failure_still_succeeds() {
    let attachments = StaticAttachmentSource::empty()
        .with_files("BILL-1", &["invoice.pdf", "receipt.pdf", "delivery.pdf"]);
    let h = harness_with(MockCredentialSource::valid(), attachments);
    h.accounting.fail_attachment("receipt.pdf", LedgerBridgeError::remote(413, "too large"));
    let mut contact = supplier().with_remote_id("X-CONTACT-1");
    let mut bill = bill(DocumentType::SupplierBill);

    let report = h.service.push_bill(&mut bill, &mut contact).await.unwrap();

    assert_eq!(report.attachments.uploaded, vec!["invoice.pdf", "delivery.pdf"]);
    assert_eq!(report.attachments.failed.len(), 1);
    assert_eq!(report.attachments.failed[0].filename, "receipt.pdf");
    assert!(!report.attachments.is_complete());
    assert!(bill.is_pushed());

    let uploads: Vec<_> = h
        .accounting
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            AccountingCall::UploadAttachment { remote_invoice_id, filename } => {
                Some((remote_invoice_id, filename))
            }
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 3);
    assert!(uploads.iter().all(|(id, _)| *id == report.remote_invoice_id));

    let messages: Vec<_> = bill.audit_log.iter().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"Attachment 'invoice.pdf' uploaded to Xero."));
    assert!(messages.contains(&"Attachment 'delivery.pdf' uploaded to Xero."));
    let failure = bill
        .audit_log
        .iter()
        .find(|n| n.message.starts_with("Failed to upload attachment 'receipt.pdf' to Xero: "))
        .unwrap();
    assert_eq!(failure.level, AuditLevel::Warning);
}

/// Validates that an attachment lookup failure is noted without failing
/// the push.
#[tokio::test]
async fn attachment_lookup_failure_is_noted() {
    let h = harness_with(
        MockCredentialSource::valid(),
        StaticAttachmentSource::failing(LedgerBridgeError::Storage("disk gone".into())),
    );
    let mut contact = supplier().with_remote_id("X-CONTACT-1");
    let mut bill = bill(DocumentType::SupplierBill);

    let report = h.service.push_bill(&mut bill, &mut contact).await.unwrap();

    assert!(report.attachments.skipped.is_some());
    assert!(bill.is_pushed());
    assert_eq!(bill.audit_log.last().unwrap().level, AuditLevel::Warning);
}

/// Validates that uploading for an unpushed bill is a no-op.
#[tokio::test]
async fn upload_without_remote_invoice_is_noop() {
    let attachments = StaticAttachmentSource::empty().with_files("BILL-1", &["invoice.pdf"]);
    let h = harness_with(MockCredentialSource::valid(), attachments);
    let mut bill = bill(DocumentType::SupplierBill);

    let report = h.service.upload_all_attachments(&mut bill).await.unwrap();

    assert!(report.uploaded.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(h.accounting.call_count(), 0);
    assert_eq!(h.credentials.calls(), 0);
    assert!(bill.audit_log.is_empty());
}

/// Validates a standalone upload pass for an already-pushed bill.
#[tokio::test]
async fn upload_all_attachments_for_pushed_bill() {
    let attachments = StaticAttachmentSource::empty().with_files("BILL-1", &["scan.pdf"]);
    let h = harness_with(MockCredentialSource::valid(), attachments);
    let mut bill = bill(DocumentType::SupplierBill);
    bill.remote_invoice_id = Some("INV-42".into());

    let report = h.service.upload_all_attachments(&mut bill).await.unwrap();

    assert_eq!(report.uploaded, vec!["scan.pdf"]);
    assert_eq!(
        h.accounting.calls(),
        vec![AccountingCall::UploadAttachment {
            remote_invoice_id: "INV-42".into(),
            filename: "scan.pdf".into(),
        }]
    );
}
