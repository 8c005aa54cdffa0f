//! Xero accounting API wire types
//!
//! The API speaks PascalCase JSON. Requests wrap entities in a plural
//! envelope (`{"Contacts": [...]}`) and responses echo the same envelope
//! with server-assigned ids filled in.

use serde::{Deserialize, Serialize};

use ledgerbridge_core::{DraftBill, NewContact};
use ledgerbridge_domain::constants::{BILL_INVOICE_TYPE, BILL_STATUS_DRAFT};

/// Contact creation payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactPayload {
    pub name: String,
    pub email_address: String,
    pub is_supplier: bool,
}

impl From<&NewContact> for ContactPayload {
    fn from(contact: &NewContact) -> Self {
        Self {
            name: contact.name.clone(),
            email_address: contact.email.clone().unwrap_or_default(),
            is_supplier: contact.is_supplier,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactsRequest {
    pub contacts: Vec<ContactPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Vec<CreatedContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedContact {
    #[serde(rename = "ContactID")]
    pub contact_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactRef {
    #[serde(rename = "ContactID")]
    pub contact_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItemPayload {
    pub description: String,
    pub quantity: f64,
    pub unit_amount: f64,
    pub account_code: String,
}

/// Draft payable invoice payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicePayload {
    #[serde(rename = "Type")]
    pub invoice_type: &'static str,
    pub contact: ContactRef,
    pub line_items: Vec<LineItemPayload>,
    pub status: &'static str,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
}

impl From<&DraftBill> for InvoicePayload {
    fn from(bill: &DraftBill) -> Self {
        Self {
            invoice_type: BILL_INVOICE_TYPE,
            contact: ContactRef { contact_id: bill.remote_contact_id().to_string() },
            line_items: bill
                .lines()
                .iter()
                .map(|line| LineItemPayload {
                    description: line.description.clone(),
                    quantity: line.quantity,
                    unit_amount: line.unit_amount,
                    account_code: line.account_code.clone(),
                })
                .collect(),
            status: BILL_STATUS_DRAFT,
            date: bill.date().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicesRequest {
    pub invoices: Vec<InvoicePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicesResponse {
    #[serde(default)]
    pub invoices: Vec<CreatedInvoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedInvoice {
    #[serde(rename = "InvoiceID")]
    pub invoice_id: Option<String>,
}
