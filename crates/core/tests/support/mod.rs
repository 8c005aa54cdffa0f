//! Shared test helpers for `ledgerbridge-core` integration tests.
//!
//! In-memory implementations of every core port. Each mock records the calls
//! it receives so tests can assert on network-free behaviour.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledgerbridge_core::{
    AccountingClient, AttachmentSource, CredentialSource, Credentials, DraftBill, NewContact,
    PushedBill, SettingsStore, TenantDirectory,
};
use ledgerbridge_domain::{
    AttachmentRef, Bill, ConnectionConfig, LedgerBridgeError, Result as DomainResult, Tenant,
};

/// One call received by [`MockAccountingClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum AccountingCall {
    CreateContact { tenant_id: String, contact: NewContact },
    CreateDraftBill { tenant_id: String, bill: DraftBill },
    UploadAttachment { remote_invoice_id: String, filename: String },
}

/// Recording accounting client.
///
/// Ids are generated as `CONTACT-n` / `INVOICE-n`. Failures can be scripted
/// per operation or per attachment filename.
#[derive(Debug, Clone, Default)]
pub struct MockAccountingClient {
    calls: Arc<Mutex<Vec<AccountingCall>>>,
    contact_failures: Arc<Mutex<VecDeque<LedgerBridgeError>>>,
    bill_failures: Arc<Mutex<VecDeque<LedgerBridgeError>>>,
    failing_attachments: Arc<Mutex<HashMap<String, LedgerBridgeError>>>,
}

impl MockAccountingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_contact(&self, error: LedgerBridgeError) {
        self.contact_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_bill(&self, error: LedgerBridgeError) {
        self.bill_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_attachment(&self, filename: &str, error: LedgerBridgeError) {
        self.failing_attachments.lock().unwrap().insert(filename.to_string(), error);
    }

    pub fn calls(&self) -> Vec<AccountingCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn draft_bills(&self) -> Vec<DraftBill> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AccountingCall::CreateDraftBill { bill, .. } => Some(bill),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: AccountingCall) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

#[async_trait]
impl AccountingClient for MockAccountingClient {
    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &NewContact,
    ) -> DomainResult<String> {
        let n = self.record(AccountingCall::CreateContact {
            tenant_id: credentials.tenant_id.clone(),
            contact: contact.clone(),
        });
        match self.contact_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(format!("CONTACT-{n}")),
        }
    }

    async fn create_draft_bill(
        &self,
        credentials: &Credentials,
        bill: &DraftBill,
    ) -> DomainResult<String> {
        let n = self.record(AccountingCall::CreateDraftBill {
            tenant_id: credentials.tenant_id.clone(),
            bill: bill.clone(),
        });
        match self.bill_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(format!("INVOICE-{n}")),
        }
    }

    async fn upload_attachment(
        &self,
        _credentials: &Credentials,
        bill: &PushedBill,
        attachment: &AttachmentRef,
    ) -> DomainResult<()> {
        self.record(AccountingCall::UploadAttachment {
            remote_invoice_id: bill.remote_invoice_id().to_string(),
            filename: attachment.filename.clone(),
        });
        match self.failing_attachments.lock().unwrap().get(&attachment.filename) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Fixed credentials, or a fixed error.
#[derive(Debug, Clone)]
pub struct MockCredentialSource {
    outcome: Result<Credentials, LedgerBridgeError>,
    calls: Arc<Mutex<usize>>,
}

impl MockCredentialSource {
    pub fn valid() -> Self {
        Self {
            outcome: Ok(Credentials::new("access-token", "tenant-1")),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: LedgerBridgeError) -> Self {
        Self { outcome: Err(error), calls: Arc::default() }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    async fn credentials(&self) -> DomainResult<Credentials> {
        *self.calls.lock().unwrap() += 1;
        self.outcome.clone()
    }
}

/// Attachments keyed by bill id.
#[derive(Debug, Clone, Default)]
pub struct StaticAttachmentSource {
    files: Arc<HashMap<String, Vec<AttachmentRef>>>,
    failure: Option<LedgerBridgeError>,
}

impl StaticAttachmentSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_files(mut self, bill_id: &str, filenames: &[&str]) -> Self {
        let files = filenames
            .iter()
            .map(|name| AttachmentRef::new(*name, "application/pdf", b"%PDF-1.4".to_vec()))
            .collect();
        Arc::make_mut(&mut self.files).insert(bill_id.to_string(), files);
        self
    }

    pub fn failing(error: LedgerBridgeError) -> Self {
        Self { failure: Some(error), ..Self::default() }
    }
}

#[async_trait]
impl AttachmentSource for StaticAttachmentSource {
    async fn attachments_for(&self, bill: &Bill) -> DomainResult<Vec<AttachmentRef>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.files.get(&bill.id).cloned().unwrap_or_default())
    }
}

/// Scripted connections endpoint.
#[derive(Debug, Clone, Default)]
pub struct MockTenantDirectory {
    tenants: Vec<Tenant>,
    failure: Option<LedgerBridgeError>,
    tokens_seen: Arc<Mutex<Vec<String>>>,
}

impl MockTenantDirectory {
    pub fn with_tenants(tenants: Vec<Tenant>) -> Self {
        Self { tenants, ..Self::default() }
    }

    pub fn failing(error: LedgerBridgeError) -> Self {
        Self { failure: Some(error), ..Self::default() }
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TenantDirectory for MockTenantDirectory {
    async fn connections(&self, access_token: &str) -> DomainResult<Vec<Tenant>> {
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.tenants.clone()),
        }
    }
}

/// In-memory settings store.
#[derive(Debug, Clone, Default)]
pub struct MockSettingsStore {
    config: Arc<Mutex<ConnectionConfig>>,
    saves: Arc<Mutex<Vec<String>>>,
}

impl MockSettingsStore {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config: Arc::new(Mutex::new(config)), saves: Arc::default() }
    }

    pub fn tenant_id(&self) -> Option<String> {
        self.config.lock().unwrap().tenant_id.clone()
    }

    pub fn saved_tenants(&self) -> Vec<String> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn load(&self) -> DomainResult<ConnectionConfig> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save_tenant_id(&self, tenant_id: &str) -> DomainResult<()> {
        self.saves.lock().unwrap().push(tenant_id.to_string());
        self.config.lock().unwrap().tenant_id = Some(tenant_id.to_string());
        Ok(())
    }
}
