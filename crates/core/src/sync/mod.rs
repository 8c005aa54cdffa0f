//! Contact → bill → attachment synchronization

pub mod handles;
pub mod ports;
pub mod service;

pub use service::{AttachmentFailure, AttachmentUploadReport, BillPushReport, SyncService};
