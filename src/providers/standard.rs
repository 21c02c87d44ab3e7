//! Standard resource provider implementation with pluggable storage.
//!
//! [`StandardResourceProvider`] keeps SCIM logic (validation, metadata,
//! versions, uniqueness, filtering, patching) separate from persistence, which
//! is delegated to any [`StorageProvider`].
//!
//! # Features
//!
//! * Pluggable storage backends through the StorageProvider trait
//! * Schema validation of every write against the registry
//! * Server-assigned `id` and `meta` (created, lastModified, location, version)
//! * Uniqueness enforcement for `uniqueness: server|global` attributes
//! * Filtered, sorted and paginated search
//! * Optimistic concurrency through content versions
//! * Ordered attribute filter extensions applied to every returned resource
//!
//! # Example Usage
//!
//! ```rust
//! use scim_engine::providers::{RequestContext, ResourceProvider, StandardResourceProvider};
//! use scim_engine::schema::SchemaRegistry;
//! use scim_engine::storage::InMemoryStorage;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SchemaRegistry::new()?);
//! let provider = StandardResourceProvider::new(InMemoryStorage::new(), registry);
//! let context = RequestContext::with_generated_id();
//!
//! let user = provider
//!     .create_resource(
//!         "User",
//!         json!({
//!             "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!             "userName": "bjensen"
//!         }),
//!         &context,
//!     )
//!     .await?;
//! assert!(user.get_id().is_some());
//! # Ok(())
//! # }
//! ```

use super::extensions::{AttributeFilterExtension, RequestContext};
use super::provider::{ResourceProvider, SearchPage, SearchRequest, SortOrder};
use crate::attributes::{AttributeReference, ResolvedAttribute, resolve_reference};
use crate::config::EngineConfig;
use crate::error::{ScimError, ScimResult, ValidationError};
use crate::filter::{Filter, matches, parse_with_config};
use crate::patch::{PatchEngine, PatchRequest};
use crate::resource::{HttpVersion, Meta, RawVersion, Resource, VersionedResource};
use crate::schema::{
    AttributeDefinition, AttributeType, Mutability, OperationContext, ResourceSchema,
    SchemaRegistry, Uniqueness, validate_resource,
};
use crate::storage::{StorageKey, StorageProvider};

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Resource provider over a pluggable storage backend.
#[derive(Clone)]
pub struct StandardResourceProvider<S: StorageProvider> {
    storage: S,
    registry: Arc<SchemaRegistry>,
    config: EngineConfig,
    extensions: Vec<Arc<dyn AttributeFilterExtension>>,
}

impl<S> StandardResourceProvider<S>
where
    S: StorageProvider,
    S::Error: Into<ScimError>,
{
    /// Create a provider with the default configuration and no extensions.
    pub fn new(storage: S, registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(storage, registry, EngineConfig::default())
    }

    pub fn with_config(storage: S, registry: Arc<SchemaRegistry>, config: EngineConfig) -> Self {
        Self {
            storage,
            registry,
            config,
            extensions: Vec::new(),
        }
    }

    /// Append an attribute filter extension. Extensions run in the order added.
    pub fn with_extension(mut self, extension: impl AttributeFilterExtension + 'static) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Remove every stored resource.
    pub async fn clear(&self) {
        if let Err(e) = self.storage.clear().await {
            let e: ScimError = e.into();
            warn!("Failed to clear storage: {}", e);
        }
    }

    async fn load(&self, resource_type: &str, id: &str) -> ScimResult<Option<(Value, Resource)>> {
        let data = self
            .storage
            .get(StorageKey::new(resource_type, id))
            .await
            .map_err(Into::into)?;
        match data {
            Some(data) => {
                let resource = Resource::from_json(resource_type, data.clone())?;
                Ok(Some((data, resource)))
            }
            None => Ok(None),
        }
    }

    async fn load_existing(&self, resource_type: &str, id: &str) -> ScimResult<(Value, Resource)> {
        self.load(resource_type, id)
            .await?
            .ok_or_else(|| ScimError::resource_not_found(resource_type, id))
    }

    /// Write `resource` over `previous`, failing if the record changed meanwhile.
    async fn store_replacement(
        &self,
        resource: &Resource,
        previous: &Value,
        read_version: &RawVersion,
    ) -> ScimResult<()> {
        let resource_type = resource.resource_type.as_str();
        let id = resource.get_id().unwrap_or_default();
        let swapped = self
            .storage
            .replace(StorageKey::new(resource_type, id), resource.to_json(), previous)
            .await
            .map_err(Into::into)?;
        if swapped {
            return Ok(());
        }

        warn!(
            "Concurrent modification of {} resource '{}' detected",
            resource_type, id
        );
        let current = match self.load(resource_type, id).await? {
            Some((_, current)) => RawVersion::from_resource(&current).to_string(),
            None => "deleted".to_string(),
        };
        Err(ScimError::VersionMismatch {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            expected: read_version.to_string(),
            current,
        })
    }

    /// Run the attribute filter extensions over an outgoing resource.
    fn respond(
        &self,
        versioned: VersionedResource,
        context: &RequestContext,
    ) -> ScimResult<VersionedResource> {
        self.extensions.iter().try_fold(versioned, |versioned, extension| {
            versioned.map_resource(|resource| extension.filter_attributes(resource, context))
        })
    }

    fn location(&self, schema: &ResourceSchema<'_>, id: &str) -> String {
        let endpoint = schema.resource_type().endpoint.trim_start_matches('/');
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint,
            id
        )
    }

    /// Set `meta` for the resource's current content.
    fn stamp(
        &self,
        resource: &mut Resource,
        schema: &ResourceSchema<'_>,
        created: Option<DateTime<Utc>>,
    ) {
        let now = Utc::now();
        let id = resource.get_id().unwrap_or_default().to_string();
        let mut meta = Meta::new_for_creation(&schema.resource_type().name, created.unwrap_or(now))
            .with_location(self.location(schema, &id));
        meta.last_modified = Some(now);

        resource.meta = None;
        let version = HttpVersion::from(RawVersion::from_resource(resource));
        resource.meta = Some(meta.with_version(version.to_string()));
    }

    async fn check_uniqueness(
        &self,
        schema: &ResourceSchema<'_>,
        resource: &Resource,
        exclude_id: Option<&str>,
    ) -> ScimResult<()> {
        let unique: Vec<(Option<&str>, &AttributeDefinition, String)> = top_level_attributes(schema)
            .filter(|(_, attr)| {
                attr.uniqueness != Uniqueness::None
                    && !attr.multi_valued
                    && !attr.name.eq_ignore_ascii_case("id")
            })
            .filter_map(|(extension, attr)| {
                let value = resource.get(extension, &attr.name)?;
                value.as_str().map(|text| (extension, attr, text.to_string()))
            })
            .collect();
        if unique.is_empty() {
            return Ok(());
        }

        let stored = self
            .storage
            .list(&resource.resource_type)
            .await
            .map_err(Into::into)?;
        for (key, data) in stored {
            if Some(key.resource_id()) == exclude_id {
                continue;
            }
            let other = Resource::from_json(resource.resource_type.as_str(), data)?;
            for (extension, attr, value) in &unique {
                let taken = other
                    .get(*extension, &attr.name)
                    .and_then(|v| v.as_str().map(|text| same_text(attr, text, value)))
                    .unwrap_or(false);
                if taken {
                    debug!(
                        "Uniqueness violation on {}.{} = '{}'",
                        resource.resource_type, attr.name, value
                    );
                    return Err(ScimError::Uniqueness {
                        attribute: attr.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<S> ResourceProvider for StandardResourceProvider<S>
where
    S: StorageProvider,
    S::Error: Into<ScimError>,
{
    type Error = ScimError;

    async fn create_resource(
        &self,
        resource_type: &str,
        data: Value,
        context: &RequestContext,
    ) -> Result<VersionedResource, Self::Error> {
        info!(
            "Creating {} resource (request: '{}')",
            resource_type, context.request_id
        );
        trace!(
            "Create data: {}",
            serde_json::to_string(&data).unwrap_or_else(|_| "invalid json".to_string())
        );

        let schema = self.registry.resource_schema(resource_type)?;
        let mut resource = Resource::from_json(schema.resource_type().name.as_str(), data)?;
        if resource.schemas.is_empty() {
            resource.schemas.push(schema.core().id.clone());
        }

        // Server-assigned values replace anything the client sent
        strip_read_only(&mut resource, &schema);
        resource.id = Some(Uuid::new_v4().to_string());

        validate_resource(&schema, &resource, OperationContext::Create)?;
        self.check_uniqueness(&schema, &resource, None).await?;
        self.stamp(&mut resource, &schema, None);

        let id = resource.get_id().unwrap_or_default().to_string();
        let inserted = self
            .storage
            .insert(StorageKey::new(&resource.resource_type, &id), resource.to_json())
            .await
            .map_err(Into::into)?;
        if !inserted {
            return Err(ScimError::internal(format!(
                "Generated id '{}' already in use",
                id
            )));
        }

        debug!("Created {} resource '{}'", resource_type, id);
        self.respond(VersionedResource::new(resource), context)
    }

    async fn get_resource(
        &self,
        resource_type: &str,
        id: &str,
        context: &RequestContext,
    ) -> Result<Option<VersionedResource>, Self::Error> {
        debug!(
            "Getting {} resource with ID '{}' (request: '{}')",
            resource_type, id, context.request_id
        );

        let schema = self.registry.resource_schema(resource_type)?;
        match self.load(&schema.resource_type().name, id).await? {
            Some((_, resource)) => {
                trace!("Resource found and returned");
                self.respond(VersionedResource::new(resource), context)
                    .map(Some)
            }
            None => {
                debug!("Resource not found");
                Ok(None)
            }
        }
    }

    async fn update_resource(
        &self,
        resource_type: &str,
        id: &str,
        data: Value,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> Result<VersionedResource, Self::Error> {
        info!(
            "Updating {} resource with ID '{}' (request: '{}')",
            resource_type, id, context.request_id
        );
        trace!(
            "Update data: {}",
            serde_json::to_string(&data).unwrap_or_else(|_| "invalid json".to_string())
        );

        let schema = self.registry.resource_schema(resource_type)?;
        let name = schema.resource_type().name.as_str();
        let (stored, current) = self.load_existing(name, id).await?;
        let read_version = check_version(&current, expected_version)?;

        let mut resource = Resource::from_json(name, data)?;
        if resource.schemas.is_empty() {
            resource.schemas.push(schema.core().id.clone());
        }
        strip_read_only(&mut resource, &schema);
        carry_over_protected(&current, &mut resource, &schema)?;
        resource.id = current.id.clone();

        validate_resource(&schema, &resource, OperationContext::Replace)?;
        self.check_uniqueness(&schema, &resource, Some(id)).await?;
        let created = current.meta.as_ref().and_then(|meta| meta.created);
        self.stamp(&mut resource, &schema, created);

        self.store_replacement(&resource, &stored, &read_version).await?;
        debug!("Replaced {} resource '{}'", resource_type, id);
        self.respond(VersionedResource::new(resource), context)
    }

    async fn delete_resource(
        &self,
        resource_type: &str,
        id: &str,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> Result<(), Self::Error> {
        info!(
            "Deleting {} resource with ID '{}' (request: '{}')",
            resource_type, id, context.request_id
        );

        let schema = self.registry.resource_schema(resource_type)?;
        let name = schema.resource_type().name.as_str();
        let (stored, current) = self.load_existing(name, id).await?;
        let read_version = check_version(&current, expected_version)?;

        let deleted = self
            .storage
            .delete_if(StorageKey::new(name, id), &stored)
            .await
            .map_err(Into::into)?;
        if deleted {
            return Ok(());
        }

        warn!(
            "Concurrent modification of {} resource '{}' detected during delete",
            resource_type, id
        );
        match self.load(name, id).await? {
            Some((_, changed)) => Err(ScimError::VersionMismatch {
                resource_type: name.to_string(),
                id: id.to_string(),
                expected: read_version.to_string(),
                current: RawVersion::from_resource(&changed).to_string(),
            }),
            None => Err(ScimError::resource_not_found(resource_type, id)),
        }
    }

    async fn search_resources(
        &self,
        resource_type: &str,
        request: &SearchRequest,
        context: &RequestContext,
    ) -> Result<SearchPage, Self::Error> {
        debug!(
            "Searching {} resources with filter {:?} (request: '{}')",
            resource_type, request.filter, context.request_id
        );

        let schema = self.registry.resource_schema(resource_type)?;
        let filter: Option<Filter> = request
            .filter
            .as_deref()
            .map(|text| parse_with_config(text, &self.config.filter))
            .transpose()?;
        let sort_by = request
            .sort_by
            .as_deref()
            .map(|text| resolve_sort(text, &schema))
            .transpose()?;

        let stored = self
            .storage
            .list(&schema.resource_type().name)
            .await
            .map_err(Into::into)?;
        let mut found = Vec::new();
        for (_, data) in stored {
            let resource = Resource::from_json(schema.resource_type().name.as_str(), data)?;
            let keep = match &filter {
                Some(filter) => matches(filter, &resource, &schema)?,
                None => true,
            };
            if keep {
                found.push(resource);
            }
        }

        if let Some(sort_by) = sort_by {
            let mut keyed: Vec<_> = found
                .into_iter()
                .map(|resource| (sort_key(&resource, &sort_by), resource))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| {
                compare_keys(a.as_ref(), b.as_ref(), request.sort_order)
            });
            found = keyed.into_iter().map(|(_, resource)| resource).collect();
        }

        let total_results = found.len();
        let start_index = request.start_index.unwrap_or(1).max(1);
        let count = request
            .count
            .unwrap_or(self.config.pagination.default_count)
            .min(self.config.pagination.max_count);
        let resources = found
            .into_iter()
            .skip(start_index - 1)
            .take(count)
            .map(|resource| self.respond(VersionedResource::new(resource), context))
            .collect::<ScimResult<Vec<_>>>()?;

        debug!(
            "Search matched {} {} resources, returning {}",
            total_results,
            resource_type,
            resources.len()
        );
        Ok(SearchPage {
            resources,
            total_results,
            start_index,
        })
    }

    async fn patch_resource(
        &self,
        resource_type: &str,
        id: &str,
        request: &PatchRequest,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> Result<VersionedResource, Self::Error> {
        info!(
            "Patching {} resource with ID '{}' ({} operations, request: '{}')",
            resource_type,
            id,
            request.operations.len(),
            context.request_id
        );

        request.validate()?;
        let schema = self.registry.resource_schema(resource_type)?;
        let name = schema.resource_type().name.as_str();
        let (stored, current) = self.load_existing(name, id).await?;
        let read_version = check_version(&current, expected_version)?;

        let engine = PatchEngine::from_config(&self.config);
        let mut patched = engine.apply(&current, &request.operations, &schema)?;
        if RawVersion::from_resource(&patched) == read_version {
            debug!("Patch left {} resource '{}' unchanged", resource_type, id);
            return self.respond(VersionedResource::new(current), context);
        }

        self.check_uniqueness(&schema, &patched, Some(id)).await?;
        let created = current.meta.as_ref().and_then(|meta| meta.created);
        self.stamp(&mut patched, &schema, created);

        self.store_replacement(&patched, &stored, &read_version).await?;
        self.respond(VersionedResource::new(patched), context)
    }

    async fn resource_exists(
        &self,
        resource_type: &str,
        id: &str,
        context: &RequestContext,
    ) -> Result<bool, Self::Error> {
        trace!(
            "Checking existence of {} resource '{}' (request: '{}')",
            resource_type, id, context.request_id
        );
        let schema = self.registry.resource_schema(resource_type)?;
        self.storage
            .exists(StorageKey::new(&schema.resource_type().name, id))
            .await
            .map_err(Into::into)
    }
}

/// Compare the stored version with the caller's expectation and return it.
fn check_version(current: &Resource, expected: Option<&RawVersion>) -> ScimResult<RawVersion> {
    let version = RawVersion::from_resource(current);
    match expected {
        Some(expected) if *expected != version => Err(ScimError::VersionMismatch {
            resource_type: current.resource_type.clone(),
            id: current.get_id().unwrap_or_default().to_string(),
            expected: expected.to_string(),
            current: version.to_string(),
        }),
        _ => Ok(version),
    }
}

fn resolve_sort<'a>(text: &str, schema: &ResourceSchema<'a>) -> ScimResult<ResolvedAttribute<'a>> {
    let reference: AttributeReference = text.parse()?;
    Ok(resolve_reference(&reference, schema)?)
}

fn top_level_attributes<'a>(
    schema: &ResourceSchema<'a>,
) -> impl Iterator<Item = (Option<&'a str>, &'a AttributeDefinition)> {
    let core = schema.core();
    std::iter::once(core)
        .chain(schema.extensions().iter().copied())
        .flat_map(move |s| {
            let extension = (s.id != core.id).then_some(s.id.as_str());
            s.attributes.iter().map(move |attr| (extension, attr))
        })
}

/// Drop client-supplied values of readOnly attributes.
fn strip_read_only(resource: &mut Resource, schema: &ResourceSchema<'_>) {
    resource.meta = None;
    for (extension, attr) in top_level_attributes(schema) {
        if attr.mutability == Mutability::ReadOnly
            && resource.remove(extension, &attr.name).is_some()
        {
            trace!("Ignoring client-supplied readOnly attribute '{}'", attr.name);
        }
    }
}

/// Keep readOnly values from `current` and reject changes to set immutable ones.
fn carry_over_protected(
    current: &Resource,
    replacement: &mut Resource,
    schema: &ResourceSchema<'_>,
) -> ScimResult<()> {
    for (extension, attr) in top_level_attributes(schema) {
        let Some(existing) = current.get(extension, &attr.name) else {
            continue;
        };
        match attr.mutability {
            Mutability::ReadOnly => {
                replacement.set(extension, &attr.name, existing.into_owned())?;
            }
            Mutability::Immutable => match replacement
                .get(extension, &attr.name)
                .map(Cow::into_owned)
            {
                Some(new) if new != *existing => {
                    return Err(ValidationError::ImmutableAttribute {
                        attribute: attr.name.clone(),
                    }
                    .into());
                }
                Some(_) => {}
                None => replacement.set(extension, &attr.name, existing.into_owned())?,
            },
            _ => {}
        }
    }
    external_id_carry_over(current, replacement);
    Ok(())
}

fn external_id_carry_over(current: &Resource, replacement: &mut Resource) {
    if replacement.external_id.is_none() {
        replacement.external_id.clone_from(&current.external_id);
    }
}

fn same_text(attr: &AttributeDefinition, a: &str, b: &str) -> bool {
    if attr.case_exact {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Comparable form of a resource's value for `sortBy`.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum SortKey {
    Boolean(bool),
    Number(f64),
    Time(DateTime<Utc>),
    Text(String),
}

/// Read the sort value; multi-valued attributes sort by their primary (or first) element.
fn sort_key(resource: &Resource, sort_by: &ResolvedAttribute<'_>) -> Option<SortKey> {
    let attribute = sort_by.attribute;
    let value = resource.get(sort_by.extension(), &attribute.name)?;

    let element = match value.as_ref() {
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("primary").and_then(Value::as_bool) == Some(true))
            .or_else(|| items.first())?
            .clone(),
        other => other.clone(),
    };

    let (definition, scalar) = match sort_by.sub_attribute {
        Some(sub) => (sub, find_key_value(&element, &sub.name)?),
        None if attribute.is_complex() => {
            (attribute.sub_attribute("value")?, find_key_value(&element, "value")?)
        }
        None => (attribute, element),
    };

    match (&definition.data_type, scalar) {
        (_, Value::Bool(b)) => Some(SortKey::Boolean(b)),
        (_, Value::Number(n)) => n.as_f64().map(SortKey::Number),
        (AttributeType::DateTime, Value::String(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|t| SortKey::Time(t.with_timezone(&Utc))),
        (_, Value::String(text)) if definition.case_exact => Some(SortKey::Text(text)),
        (_, Value::String(text)) => Some(SortKey::Text(text.to_lowercase())),
        _ => None,
    }
}

fn find_key_value(element: &Value, name: &str) -> Option<Value> {
    element
        .as_object()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

/// Missing values sort last in either direction.
fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
    }
}
