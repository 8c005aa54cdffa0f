//! Accounting entities mirrored to the remote ledger

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A counterparty in the host system.
///
/// Once `remote_contact_id` is set it is authoritative and the contact is
/// never created remotely again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub remote_contact_id: Option<String>,
}

impl Contact {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), email: None, remote_contact_id: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_remote_id(mut self, remote_contact_id: impl Into<String>) -> Self {
        self.remote_contact_id = Some(remote_contact_id.into());
        self
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.remote_contact_id.is_some()
    }
}

/// Kind of accounting document a host record represents.
///
/// Serialized with the host's move-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "in_invoice")]
    SupplierBill,
    #[serde(rename = "in_refund")]
    SupplierRefund,
    #[serde(rename = "out_invoice")]
    CustomerInvoice,
    #[serde(rename = "out_refund")]
    CustomerRefund,
    #[serde(rename = "entry")]
    JournalEntry,
}

impl DocumentType {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SupplierBill => "in_invoice",
            Self::SupplierRefund => "in_refund",
            Self::CustomerInvoice => "out_invoice",
            Self::CustomerRefund => "out_refund",
            Self::JournalEntry => "entry",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "in_invoice" => Some(Self::SupplierBill),
            "in_refund" => Some(Self::SupplierRefund),
            "out_invoice" => Some(Self::CustomerInvoice),
            "out_refund" => Some(Self::CustomerRefund),
            "entry" => Some(Self::JournalEntry),
            _ => None,
        }
    }

    /// Only supplier bills are pushed as payable invoices.
    #[must_use]
    pub fn is_payable_bill(&self) -> bool {
        matches!(self, Self::SupplierBill)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLine {
    pub description: String,
    pub quantity: f64,
    pub unit_amount: f64,
}

impl BillLine {
    pub fn new(description: impl Into<String>, quantity: f64, unit_amount: f64) -> Self {
        Self { description: description.into(), quantity, unit_amount }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Info,
    Warning,
}

/// Human-readable note appended to a bill's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    pub level: AuditLevel,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditNote {
    pub fn info(message: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self { level: AuditLevel::Info, message: message.into(), recorded_at }
    }

    pub fn warning(message: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self { level: AuditLevel::Warning, message: message.into(), recorded_at }
    }
}

/// A host accounting document pushed as a draft payable invoice.
///
/// `remote_invoice_id` is set after a successful push. Pushing again
/// creates a second remote invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub document_type: DocumentType,
    pub contact_id: String,
    pub date: Option<NaiveDate>,
    pub lines: Vec<BillLine>,
    pub remote_invoice_id: Option<String>,
    #[serde(default)]
    pub audit_log: Vec<AuditNote>,
}

impl Bill {
    pub fn new(
        id: impl Into<String>,
        document_type: DocumentType,
        contact_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            document_type,
            contact_id: contact_id.into(),
            date: None,
            lines: Vec::new(),
            remote_invoice_id: None,
            audit_log: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: BillLine) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn is_pushed(&self) -> bool {
        self.remote_invoice_id.is_some()
    }

    pub fn record(&mut self, note: AuditNote) {
        self.audit_log.push(note);
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(BillLine::total).sum()
    }
}

/// Binary file attached to a bill. Loaded on demand, never persisted here.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentRef {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { filename: filename.into(), mime_type: mime_type.into(), bytes }
    }
}

impl fmt::Debug for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentRef")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An organisation the authorized user granted access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
}

impl Tenant {
    pub fn new(tenant_id: impl Into<String>, tenant_name: impl Into<String>) -> Self {
        Self { tenant_id: tenant_id.into(), tenant_name: tenant_name.into() }
    }
}
