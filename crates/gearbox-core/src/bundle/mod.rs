//! Bundle resolution: flattening nested bundles into ordered tool lists.

pub mod resolver;

pub use resolver::{BundleResolver, dedup_preserving_order, expand_bundle};
