//! Xero accounting API client

use std::fmt;

use async_trait::async_trait;
use ledgerbridge_common::http::{read_error_body, HttpClient};
use ledgerbridge_core::{
    AccountingClient, Credentials, DraftBill, NewContact, PushedBill, TenantDirectory,
};
use ledgerbridge_domain::constants::{
    ACCOUNTING_API_PATH, DEFAULT_API_BASE_URL, DEFAULT_CONNECTIONS_URL, TENANT_HEADER,
};
use ledgerbridge_domain::{AttachmentRef, LedgerBridgeError, Result, Tenant};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{ContactsRequest, ContactsResponse, InvoicesRequest, InvoicesResponse};

/// Xero API client for contacts, invoices, attachments and connections
#[derive(Clone)]
pub struct XeroClient {
    http: HttpClient,
    api_base: String,
    connections_url: String,
}

impl XeroClient {
    /// Create a client against the production endpoints
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE_URL.to_string(),
            connections_url: DEFAULT_CONNECTIONS_URL.to_string(),
        }
    }

    /// Override the API host (`https://api.xero.com` by default)
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the tenant connections endpoint
    #[must_use]
    pub fn with_connections_url(mut self, url: impl Into<String>) -> Self {
        self.connections_url = url.into();
        self
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{ACCOUNTING_API_PATH}/{resource}", self.api_base)
    }

    fn authorized(&self, method: Method, url: &str, credentials: &Credentials) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.access_token))
            .header(TENANT_HEADER, credentials.tenant_id.as_str())
    }

    /// Send and map any non-2xx response to `RemoteApi` with the raw body.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.http.send(request).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "received Xero API response");

        if status.is_success() {
            Ok(response)
        } else {
            let body = read_error_body(response).await;
            Err(LedgerBridgeError::remote(status.as_u16(), body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request.header(ACCEPT, "application/json")).await?;
        response.json::<T>().await.map_err(|err| {
            LedgerBridgeError::InvalidResponse(format!("failed to parse Xero response: {err}"))
        })
    }
}

impl fmt::Debug for XeroClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XeroClient")
            .field("api_base", &self.api_base)
            .field("connections_url", &self.connections_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccountingClient for XeroClient {
    async fn create_contact(&self, credentials: &Credentials, contact: &NewContact) -> Result<String> {
        let url = self.endpoint("Contacts");
        let payload = ContactsRequest { contacts: vec![contact.into()] };
        let request = self.authorized(Method::POST, &url, credentials).json(&payload);

        let response: ContactsResponse = self.send_json(request).await?;
        let contact_id = response
            .contacts
            .into_iter()
            .next()
            .and_then(|c| c.contact_id)
            .ok_or_else(|| {
                LedgerBridgeError::InvalidResponse("contact response carried no ContactID".into())
            })?;

        info!(contact_id = %contact_id, name = %contact.name, "Xero contact created");
        Ok(contact_id)
    }

    async fn create_draft_bill(&self, credentials: &Credentials, bill: &DraftBill) -> Result<String> {
        let url = self.endpoint("Invoices");
        let payload = InvoicesRequest { invoices: vec![bill.into()] };
        let request = self.authorized(Method::POST, &url, credentials).json(&payload);

        let response: InvoicesResponse = self.send_json(request).await?;
        let invoice_id = response
            .invoices
            .into_iter()
            .next()
            .and_then(|i| i.invoice_id)
            .ok_or_else(|| {
                LedgerBridgeError::InvalidResponse("invoice response carried no InvoiceID".into())
            })?;

        info!(invoice_id = %invoice_id, lines = bill.lines().len(), "Xero draft bill created");
        Ok(invoice_id)
    }

    async fn upload_attachment(
        &self,
        credentials: &Credentials,
        bill: &PushedBill,
        attachment: &AttachmentRef,
    ) -> Result<()> {
        let url = self.endpoint(&format!(
            "Invoices/{}/Attachments/{}",
            bill.remote_invoice_id(),
            urlencoding::encode(&attachment.filename)
        ));
        let request = self
            .authorized(Method::POST, &url, credentials)
            .header(CONTENT_TYPE, attachment.mime_type.as_str())
            .body(attachment.bytes.clone());

        self.send(request).await?;
        debug!(
            invoice_id = %bill.remote_invoice_id(),
            filename = %attachment.filename,
            bytes = attachment.bytes.len(),
            "Xero attachment uploaded"
        );
        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for XeroClient {
    async fn connections(&self, access_token: &str) -> Result<Vec<Tenant>> {
        let request = self
            .http
            .request(Method::GET, &self.connections_url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(CONTENT_TYPE, "application/json");

        let tenants: Vec<Tenant> = self.send_json(request).await?;
        debug!(count = tenants.len(), "Xero connections listed");
        Ok(tenants)
    }
}

/// Build the shared HTTP client from settings.
///
/// # Errors
/// Returns `InvalidInput` if the underlying client cannot be constructed.
pub fn build_http_client(timeout_secs: u64, max_attempts: u32) -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .max_attempts(usize::try_from(max_attempts).unwrap_or(1))
        .build()
}
