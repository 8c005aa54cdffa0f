//! Command implementations behind the CLI

use std::time::Duration;

use chrono::Utc;
use ledgerbridge_common::auth::TokenState;
use ledgerbridge_core::{BillPushReport, CallbackOutcome, SettingsStore};
use ledgerbridge_domain::constants::CALLBACK_WAIT_TIMEOUT_SECS;
use ledgerbridge_domain::{Bill, BillLine, Contact, DocumentType, Result};
use ledgerbridge_infra::CallbackServer;
use tracing::info;

use crate::context::AppContext;

/// Connection status for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub token: TokenState,
    pub tenant_id: Option<String>,
}

/// Run first-time authorization: listen on the redirect URI, hand the
/// consent URL to `on_url` and wait for the browser to come back.
///
/// # Errors
/// Listener bind failures and the wait timeout.
pub async fn authorize<F>(ctx: &AppContext, timeout: Option<Duration>, on_url: F) -> Result<CallbackOutcome>
where
    F: FnOnce(&str),
{
    let mut server = CallbackServer::start(ctx.flow.clone()).await?;
    let request = ctx.flow.begin().await;
    on_url(&request.url);

    let timeout = timeout.unwrap_or(Duration::from_secs(CALLBACK_WAIT_TIMEOUT_SECS));
    let outcome = server.wait(timeout).await;
    server.shutdown().await?;

    let outcome = outcome?;
    info!(success = outcome.is_success(), "authorization finished");
    Ok(outcome)
}

/// Token state and cached tenant. Never refreshes.
///
/// # Errors
/// Store read failures.
pub async fn status(ctx: &AppContext) -> Result<ConnectionStatus> {
    let token = ctx.tokens.state().await?;
    let tenant_id = ctx.settings.load().await?.tenant_id;
    Ok(ConnectionStatus { token, tenant_id })
}

/// Push a demo supplier bill, with any files found in
/// `{attachments_dir}/{bill_id}/` attached.
///
/// # Errors
/// Anything [`SyncService::push_bill`](ledgerbridge_core::SyncService::push_bill) returns.
pub async fn push_demo(ctx: &AppContext, bill_id: &str) -> Result<(Contact, Bill, BillPushReport)> {
    // Unique name; the API rejects duplicate contact names.
    let suffix = Utc::now().timestamp();
    let mut contact = Contact::new(format!("demo-supplier-{suffix}"), format!("Demo Supplier {suffix}"))
        .with_email(format!("supplier_{suffix}@demo.com"));
    let mut bill = Bill::new(bill_id, DocumentType::SupplierBill, contact.id.clone())
        .with_line(BillLine::new("Demo Consultation Services", 1.0, 100.0));

    let report = ctx.sync.push_bill(&mut bill, &mut contact).await?;
    Ok((contact, bill, report))
}
