//! Settings file handling

pub mod settings;

pub use settings::{Settings, DEFAULT_SETTINGS_FILE};
