//! A resource paired with its content version.

use super::{
    resource::Resource,
    version::{HttpVersion, RawVersion, ScimVersion},
};

/// A resource together with the version of its content.
///
/// The version is always derived from the content (see
/// [`ScimVersion::from_resource`]), so two resources with equal attributes
/// share a version whatever their `meta` says.
#[derive(Debug, Clone)]
pub struct VersionedResource {
    resource: Resource,
    version: RawVersion,
}

impl VersionedResource {
    pub fn new(resource: Resource) -> Self {
        let version = RawVersion::from_resource(&resource);
        Self { resource, version }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn version(&self) -> &RawVersion {
        &self.version
    }

    /// The version in weak ETag form.
    pub fn etag(&self) -> HttpVersion {
        self.version.clone().into()
    }

    pub fn into_resource(self) -> Resource {
        self.resource
    }

    pub fn get_id(&self) -> Option<&str> {
        self.resource.get_id()
    }

    pub fn version_matches<F>(&self, expected: &ScimVersion<F>) -> bool {
        self.version == *expected
    }

    /// Replace the resource, keeping the version of the content it was loaded with.
    ///
    /// Used for response-only rewrites such as attribute filter extensions.
    pub fn map_resource<E>(
        self,
        f: impl FnOnce(Resource) -> Result<Resource, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            resource: f(self.resource)?,
            version: self.version,
        })
    }
}
