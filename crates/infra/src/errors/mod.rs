//! Infrastructure error mapping

pub mod conversions;

pub use conversions::InfraError;

/// Map any infrastructure error into the domain error.
pub(crate) fn to_domain<E>(err: E) -> ledgerbridge_domain::LedgerBridgeError
where
    E: Into<InfraError>,
{
    err.into().into()
}
