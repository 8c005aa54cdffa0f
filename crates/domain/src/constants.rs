//! Application constants
//!
//! Centralized location for the remote endpoints and protocol values used
//! when talking to the accounting platform.

// Identity endpoints
pub const DEFAULT_TOKEN_URL: &str = "https://identity.xero.com/connect/token";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://login.xero.com/identity/connect/authorize";
pub const DEFAULT_CONNECTIONS_URL: &str = "https://api.xero.com/connections";

// Accounting API
pub const DEFAULT_API_BASE_URL: &str = "https://api.xero.com";
pub const ACCOUNTING_API_PATH: &str = "api.xro/2.0";
pub const TENANT_HEADER: &str = "Xero-tenant-id";

/// Fixed scope list requested during consent.
pub const DEFAULT_SCOPES: &[&str] = &[
    "offline_access",
    "openid",
    "profile",
    "email",
    "accounting.transactions",
    "accounting.contacts",
    "accounting.settings",
    "accounting.attachments",
];

// Draft bill defaults
pub const BILL_INVOICE_TYPE: &str = "ACCPAY";
pub const BILL_STATUS_DRAFT: &str = "DRAFT";
/// Expense account every bill line is booked against. Not configurable.
pub const DEFAULT_ACCOUNT_CODE: &str = "429";

// Token lifecycle
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
pub const DEFAULT_CONNECTION_ID: &str = "default";

// Local callback listener
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8069/xero_callback";
pub const CALLBACK_WAIT_TIMEOUT_SECS: u64 = 300;

// HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("ledgerbridge/", env!("CARGO_PKG_VERSION"));
