//! Proof-of-sync handles
//!
//! A [`SyncedContact`] exists only for a contact with a remote id, and a
//! [`PushedBill`] only for a bill with a remote invoice id. Requests that
//! depend on an earlier step take the handle, so the pipeline cannot be run
//! out of order.

use ledgerbridge_domain::{Bill, Contact};

/// A contact known to exist remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedContact {
    contact_id: String,
    remote_id: String,
}

impl SyncedContact {
    pub(crate) fn new(contact_id: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self { contact_id: contact_id.into(), remote_id: remote_id.into() }
    }

    /// `None` until `remote_contact_id` is set.
    #[must_use]
    pub fn from_contact(contact: &Contact) -> Option<Self> {
        contact.remote_contact_id.as_ref().map(|remote| Self::new(contact.id.clone(), remote.clone()))
    }

    #[must_use]
    pub fn contact_id(&self) -> &str {
        &self.contact_id
    }

    #[must_use]
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }
}

/// A bill whose invoice exists remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedBill {
    bill_id: String,
    remote_invoice_id: String,
}

impl PushedBill {
    /// `None` until `remote_invoice_id` is set.
    #[must_use]
    pub fn from_bill(bill: &Bill) -> Option<Self> {
        bill.remote_invoice_id
            .as_ref()
            .map(|remote| Self { bill_id: bill.id.clone(), remote_invoice_id: remote.clone() })
    }

    #[must_use]
    pub fn bill_id(&self) -> &str {
        &self.bill_id
    }

    #[must_use]
    pub fn remote_invoice_id(&self) -> &str {
        &self.remote_invoice_id
    }
}
