//! SCIM resource model.
//!
//! # Key Components
//!
//! * [`Resource`] - schema-typed value tree with common attributes and extensions
//! * [`Meta`] - the `meta` block (resource type, timestamps, location, version)
//! * [`RawVersion`] / [`HttpVersion`] - content versions for optimistic concurrency
//! * [`VersionedResource`] - a resource paired with its content version

pub mod meta;
pub mod resource;
pub mod version;
pub mod versioned;

pub use meta::Meta;
pub use resource::Resource;
pub use version::{HttpVersion, RawVersion, ScimVersion, VersionError};
pub use versioned::VersionedResource;
