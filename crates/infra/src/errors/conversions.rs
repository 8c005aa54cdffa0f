//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use ledgerbridge_domain::LedgerBridgeError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LedgerBridgeError);

impl From<InfraError> for LedgerBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LedgerBridgeError> for InfraError {
    fn from(value: LedgerBridgeError) -> Self {
        InfraError(value)
    }
}

trait IntoLedgerBridgeError {
    fn into_ledgerbridge(self) -> LedgerBridgeError;
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LedgerBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerBridgeError for IoError {
    fn into_ledgerbridge(self) -> LedgerBridgeError {
        match self.kind() {
            ErrorKind::PermissionDenied => {
                LedgerBridgeError::Storage(format!("permission denied: {self}"))
            }
            ErrorKind::NotFound => LedgerBridgeError::Storage(format!("file not found: {self}")),
            ErrorKind::AddrInUse | ErrorKind::AddrNotAvailable => {
                LedgerBridgeError::Network(format!("cannot bind listener: {self}"))
            }
            _ => LedgerBridgeError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_ledgerbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → LedgerBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerBridgeError for JsonError {
    fn into_ledgerbridge(self) -> LedgerBridgeError {
        if self.is_io() {
            LedgerBridgeError::Storage(format!("I/O failure while handling JSON: {self}"))
        } else {
            LedgerBridgeError::Storage(format!(
                "corrupt JSON at line {} column {}: {self}",
                self.line(),
                self.column()
            ))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_ledgerbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → LedgerBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerBridgeError for toml::de::Error {
    fn into_ledgerbridge(self) -> LedgerBridgeError {
        LedgerBridgeError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_ledgerbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
