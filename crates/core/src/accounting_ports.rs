//! Accounting platform port interfaces
//!
//! Request types here can only be built from sync handles, so a bill cannot
//! reference a contact that has not been created remotely.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerbridge_domain::constants::DEFAULT_ACCOUNT_CODE;
use ledgerbridge_domain::{AttachmentRef, BillLine, Contact, Result, Tenant};

use crate::sync::handles::{PushedBill, SyncedContact};

/// Bearer token plus the organisation every call is scoped to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub tenant_id: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), tenant_id: tenant_id.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Contact creation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub is_supplier: bool,
}

impl NewContact {
    /// Contact created as the supplier of a payable bill.
    #[must_use]
    pub fn supplier(contact: &Contact) -> Self {
        Self { name: contact.name.clone(), email: contact.email.clone(), is_supplier: true }
    }
}

/// One line of a draft bill, booked against the fixed expense account.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftBillLine {
    pub description: String,
    pub quantity: f64,
    pub unit_amount: f64,
    pub account_code: String,
}

/// Draft payable invoice ready to be created remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftBill {
    remote_contact_id: String,
    date: NaiveDate,
    lines: Vec<DraftBillLine>,
}

impl DraftBill {
    /// Build a draft for an already-synced supplier.
    #[must_use]
    pub fn new(contact: &SyncedContact, lines: &[BillLine], date: NaiveDate) -> Self {
        let lines = lines
            .iter()
            .map(|line| DraftBillLine {
                description: line.description.clone(),
                quantity: line.quantity,
                unit_amount: line.unit_amount,
                account_code: DEFAULT_ACCOUNT_CODE.to_string(),
            })
            .collect();

        Self { remote_contact_id: contact.remote_id().to_string(), date, lines }
    }

    #[must_use]
    pub fn remote_contact_id(&self) -> &str {
        &self.remote_contact_id
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn lines(&self) -> &[DraftBillLine] {
        &self.lines
    }
}

/// Trait for accounting API operations
///
/// Non-success responses surface as `RemoteApi { status, body }` with the
/// raw body. Implementations never retry.
#[async_trait]
pub trait AccountingClient: Send + Sync {
    /// Create a contact and return its remote id
    async fn create_contact(&self, credentials: &Credentials, contact: &NewContact)
        -> Result<String>;

    /// Create a draft payable invoice and return its remote id
    async fn create_draft_bill(&self, credentials: &Credentials, bill: &DraftBill)
        -> Result<String>;

    /// Upload one file to an invoice that already exists remotely
    async fn upload_attachment(
        &self,
        credentials: &Credentials,
        bill: &PushedBill,
        attachment: &AttachmentRef,
    ) -> Result<()>;
}

/// Lists the organisations an access token is authorized for.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn connections(&self, access_token: &str) -> Result<Vec<Tenant>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_bill_uses_fixed_account_code() {
        let contact = Contact::new("C1", "Acme Supplies").with_remote_id("remote-c1");
        let synced = SyncedContact::from_contact(&contact).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let draft = DraftBill::new(&synced, &[BillLine::new("Paper", 2.0, 12.5)], date);

        assert_eq!(draft.remote_contact_id(), "remote-c1");
        assert_eq!(draft.date(), date);
        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.lines()[0].account_code, "429");
    }

    #[test]
    fn credentials_debug_hides_token() {
        let rendered = format!("{:?}", Credentials::new("very-secret", "tenant-1"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("tenant-1"));
    }
}
