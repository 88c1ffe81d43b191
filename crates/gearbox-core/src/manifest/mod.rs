//! Durable record of installed tools and bundle markers.

pub mod store;
pub mod types;

pub use store::{InstallDetails, MANIFEST_FILE, ManifestStore};
pub use types::{BundleContents, InstallMethod, InstallationRecord, MANIFEST_VERSION, Manifest};
