//! Local file persistence for tokens and connection settings

pub mod settings_file;
pub mod token_file;

pub use settings_file::FileSettingsStore;
pub use token_file::FileTokenStore;
