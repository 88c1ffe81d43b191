//! User settings and directory layout.

pub mod paths;
pub mod settings;
pub mod store;

pub use paths::{BUNDLES_FILE, GearboxPaths, SETTINGS_FILE, TOOLS_FILE};
pub use settings::GearboxSettings;
pub use store::SettingsStore;
