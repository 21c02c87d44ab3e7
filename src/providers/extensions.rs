//! Request context and attribute filter extensions.
//!
//! Extensions are callbacks injected into a provider at construction. Every
//! resource a provider hands back runs through them in registration order,
//! before attribute projection.

use crate::error::ScimResult;
use crate::resource::Resource;
use uuid::Uuid;

/// Per-request information available to providers and extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// Raw `attributes` tokens of the request
    pub attributes: Vec<String>,
    /// Raw `excludedAttributes` tokens of the request
    pub excluded_attributes: Vec<String>,
}

impl RequestContext {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            attributes: Vec::new(),
            excluded_attributes: Vec::new(),
        }
    }

    pub fn with_generated_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_excluded_attributes(mut self, excluded_attributes: Vec<String>) -> Self {
        self.excluded_attributes = excluded_attributes;
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}

/// Rewrites a resource on its way out of a provider.
///
/// ```rust
/// use scim_engine::error::ScimResult;
/// use scim_engine::providers::{AttributeFilterExtension, RequestContext};
/// use scim_engine::Resource;
///
/// struct HideTitle;
///
/// impl AttributeFilterExtension for HideTitle {
///     fn filter_attributes(&self, mut resource: Resource, _: &RequestContext) -> ScimResult<Resource> {
///         resource.remove(None, "title");
///         Ok(resource)
///     }
/// }
/// ```
pub trait AttributeFilterExtension: Send + Sync {
    fn filter_attributes(&self, resource: Resource, context: &RequestContext)
    -> ScimResult<Resource>;
}

impl<F> AttributeFilterExtension for F
where
    F: Fn(Resource, &RequestContext) -> ScimResult<Resource> + Send + Sync,
{
    fn filter_attributes(
        &self,
        resource: Resource,
        context: &RequestContext,
    ) -> ScimResult<Resource> {
        self(resource, context)
    }
}
