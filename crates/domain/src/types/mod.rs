//! Domain types and models

pub mod accounting;
pub mod token;

pub use accounting::{
    AttachmentRef, AuditLevel, AuditNote, Bill, BillLine, Contact, DocumentType, Tenant,
};
pub use token::{ConnectionId, TokenRecord};
