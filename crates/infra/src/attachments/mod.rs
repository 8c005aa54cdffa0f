//! Attachment sources

pub mod directory;

pub use directory::DirectoryAttachmentSource;
