//! Framework-agnostic operation handler.
//!
//! [`ScimOperationHandler`] turns a structured request into a structured
//! response: it validates attribute selection before any engine runs, calls the
//! provider, projects every returned resource and maps failures onto SCIM error
//! bodies. Route binding and content negotiation stay with the caller.

use crate::attributes::{AttributeSelection, parse_attribute_list};
use crate::error::{ScimError, ScimResult};
use crate::patch::PatchRequest;
use crate::providers::{RequestContext, ResourceProvider, SearchRequest};
use crate::resource::{HttpVersion, RawVersion, VersionedResource};
use crate::schema::{ResourceSchema, SchemaRegistry};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Schema URN of a list response message.
pub const LIST_RESPONSE_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

/// Kinds of operations the handler dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScimOperationType {
    Create,
    Get,
    Replace,
    Patch,
    Delete,
    Search,
}

/// Structured request for a SCIM operation.
#[derive(Debug, Clone)]
pub struct ScimOperationRequest {
    pub operation: ScimOperationType,
    /// Resource type name (e.g. "User")
    pub resource_type: String,
    pub resource_id: Option<String>,
    /// Body of create, replace and patch requests
    pub data: Option<Value>,
    /// Parameters of search requests
    pub query: Option<SearchRequest>,
    /// Raw comma-separated `attributes` parameter
    pub attributes: Option<String>,
    /// Raw comma-separated `excludedAttributes` parameter
    pub excluded_attributes: Option<String>,
    pub request_id: Option<String>,
    pub if_match: Option<HttpVersion>,
    pub if_none_match: Option<HttpVersion>,
}

impl ScimOperationRequest {
    fn new(operation: ScimOperationType, resource_type: impl Into<String>) -> Self {
        Self {
            operation,
            resource_type: resource_type.into(),
            resource_id: None,
            data: None,
            query: None,
            attributes: None,
            excluded_attributes: None,
            request_id: None,
            if_match: None,
            if_none_match: None,
        }
    }

    pub fn create(resource_type: impl Into<String>, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(ScimOperationType::Create, resource_type)
        }
    }

    pub fn get(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Self::new(ScimOperationType::Get, resource_type)
        }
    }

    pub fn replace(resource_type: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Self {
            resource_id: Some(id.into()),
            data: Some(data),
            ..Self::new(ScimOperationType::Replace, resource_type)
        }
    }

    /// `data` is a PatchOp message body.
    pub fn patch(resource_type: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Self {
            resource_id: Some(id.into()),
            data: Some(data),
            ..Self::new(ScimOperationType::Patch, resource_type)
        }
    }

    pub fn delete(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Self::new(ScimOperationType::Delete, resource_type)
        }
    }

    pub fn search(resource_type: impl Into<String>, query: SearchRequest) -> Self {
        Self {
            query: Some(query),
            ..Self::new(ScimOperationType::Search, resource_type)
        }
    }

    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    pub fn with_excluded_attributes(mut self, excluded_attributes: impl Into<String>) -> Self {
        self.excluded_attributes = Some(excluded_attributes.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_if_match(mut self, version: HttpVersion) -> Self {
        self.if_match = Some(version);
        self
    }

    pub fn with_if_none_match(mut self, version: HttpVersion) -> Self {
        self.if_none_match = Some(version);
        self
    }

    fn id(&self) -> ScimResult<&str> {
        self.resource_id
            .as_deref()
            .ok_or_else(|| {
                ScimError::invalid_request(format!("{:?} requires a resource id", self.operation))
            })
    }

    fn body(&mut self) -> ScimResult<Value> {
        self.data
            .take()
            .ok_or_else(|| {
                ScimError::invalid_request(format!("{:?} requires a request body", self.operation))
            })
    }
}

/// Structured response: status, body and the headers a transport would set.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimOperationResponse {
    pub status: u16,
    pub body: Option<Value>,
    /// Weak ETag of the returned resource
    pub etag: Option<HttpVersion>,
    /// `meta.location` of a created resource
    pub location: Option<String>,
    pub request_id: String,
}

impl ScimOperationResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_error(error: &ScimError, request_id: String) -> Self {
        let body = match error {
            ScimError::NotModified => None,
            _ => serde_json::to_value(error.to_error_response()).ok(),
        };
        Self {
            status: error.status(),
            body,
            etag: None,
            location: None,
            request_id,
        }
    }
}

/// A page of search results on the wire (RFC 7644 section 3.4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub schemas: Vec<String>,
    pub total_results: usize,
    pub start_index: usize,
    pub items_per_page: usize,
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ListResponse {
    pub fn new(resources: Vec<Value>, total_results: usize, start_index: usize) -> Self {
        Self {
            schemas: vec![LIST_RESPONSE_SCHEMA.to_string()],
            total_results,
            start_index,
            items_per_page: resources.len(),
            resources,
        }
    }
}

/// Dispatches structured requests to a provider and shapes the results.
pub struct ScimOperationHandler<P: ResourceProvider> {
    provider: P,
    registry: Arc<SchemaRegistry>,
}

impl<P> ScimOperationHandler<P>
where
    P: ResourceProvider + Sync,
    P::Error: Into<ScimError>,
{
    pub fn new(provider: P, registry: Arc<SchemaRegistry>) -> Self {
        Self { provider, registry }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one operation. Failures come back as SCIM error responses.
    pub async fn handle_operation(&self, request: ScimOperationRequest) -> ScimOperationResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!(
            "SCIM operation handler processing {:?} for {} (request: '{}')",
            request.operation, request.resource_type, request_id
        );

        match self.dispatch(request, &request_id).await {
            Ok(response) => {
                debug!(
                    "SCIM operation handler completed with status {} (request: '{}')",
                    response.status, request_id
                );
                response
            }
            Err(ScimError::NotModified) => {
                debug!("Resource not modified (request: '{}')", request_id);
                ScimOperationResponse::from_error(&ScimError::NotModified, request_id)
            }
            Err(e) => {
                warn!(
                    "SCIM operation handler failed: {} (request: '{}')",
                    e, request_id
                );
                ScimOperationResponse::from_error(&e, request_id)
            }
        }
    }

    async fn dispatch(
        &self,
        mut request: ScimOperationRequest,
        request_id: &str,
    ) -> ScimResult<ScimOperationResponse> {
        let schema = self.registry.resource_schema(&request.resource_type)?;

        let (include, exclude) = selection_tokens(&request);
        let selection = AttributeSelection::from_tokens(&include, &exclude, &schema)?;
        let context = RequestContext::new(request_id.to_string())
            .with_attributes(include)
            .with_excluded_attributes(exclude);

        let resource_type = schema.resource_type().name.clone();
        let expected = request.if_match.clone().map(RawVersion::from);

        let shaped = |status: u16, versioned: VersionedResource| {
            self.resource_response(status, versioned, &selection, &schema, request_id)
        };

        match request.operation {
            ScimOperationType::Create => {
                let data = request.body()?;
                let created = self
                    .provider
                    .create_resource(&resource_type, data, &context)
                    .await
                    .map_err(Into::into)?;
                let location = created
                    .resource()
                    .meta
                    .as_ref()
                    .and_then(|meta| meta.location.clone());
                Ok(ScimOperationResponse {
                    location,
                    ..shaped(201, created)
                })
            }
            ScimOperationType::Get => {
                let id = request.id()?;
                let found = self
                    .provider
                    .get_resource(&resource_type, id, &context)
                    .await
                    .map_err(Into::into)?
                    .ok_or_else(|| ScimError::resource_not_found(&resource_type, id))?;
                if request
                    .if_none_match
                    .as_ref()
                    .is_some_and(|version| found.version_matches(version))
                {
                    return Err(ScimError::NotModified);
                }
                Ok(shaped(200, found))
            }
            ScimOperationType::Replace => {
                let data = request.body()?;
                let id = request.id()?;
                let updated = self
                    .provider
                    .update_resource(&resource_type, id, data, expected.as_ref(), &context)
                    .await
                    .map_err(Into::into)?;
                Ok(shaped(200, updated))
            }
            ScimOperationType::Patch => {
                let patch = PatchRequest::from_json(request.body()?)?;
                let id = request.id()?;
                let patched = self
                    .provider
                    .patch_resource(&resource_type, id, &patch, expected.as_ref(), &context)
                    .await
                    .map_err(Into::into)?;
                Ok(shaped(200, patched))
            }
            ScimOperationType::Delete => {
                let id = request.id()?;
                self.provider
                    .delete_resource(&resource_type, id, expected.as_ref(), &context)
                    .await
                    .map_err(Into::into)?;
                Ok(ScimOperationResponse {
                    status: 204,
                    body: None,
                    etag: None,
                    location: None,
                    request_id: request_id.to_string(),
                })
            }
            ScimOperationType::Search => {
                let query = request.query.take().unwrap_or_default();
                let page = self
                    .provider
                    .search_resources(&resource_type, &query, &context)
                    .await
                    .map_err(Into::into)?;
                let resources = page
                    .resources
                    .iter()
                    .map(|versioned| selection.apply(versioned.resource(), &schema).to_json())
                    .collect();
                let list = ListResponse::new(resources, page.total_results, page.start_index);
                Ok(ScimOperationResponse {
                    status: 200,
                    body: Some(serde_json::to_value(list)?),
                    etag: None,
                    location: None,
                    request_id: request_id.to_string(),
                })
            }
        }
    }

    fn resource_response(
        &self,
        status: u16,
        versioned: VersionedResource,
        selection: &AttributeSelection,
        schema: &ResourceSchema<'_>,
        request_id: &str,
    ) -> ScimOperationResponse {
        let body = selection.apply(versioned.resource(), schema).to_json();
        ScimOperationResponse {
            status,
            body: Some(body),
            etag: Some(versioned.etag()),
            location: None,
            request_id: request_id.to_string(),
        }
    }
}

/// Attribute tokens from the raw parameters plus any carried by a search body.
fn selection_tokens(request: &ScimOperationRequest) -> (Vec<String>, Vec<String>) {
    let mut include = request
        .attributes
        .as_deref()
        .map(parse_attribute_list)
        .unwrap_or_default();
    let mut exclude = request
        .excluded_attributes
        .as_deref()
        .map(parse_attribute_list)
        .unwrap_or_default();
    if let Some(query) = &request.query {
        include.extend(query.attributes.iter().cloned());
        exclude.extend(query.excluded_attributes.iter().cloned());
    }
    (include, exclude)
}
