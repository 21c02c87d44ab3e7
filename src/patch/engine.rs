//! PATCH engine: applies add/remove/replace operations to a resource.
//!
//! Operations run in order against a working copy of the resource. The copy is
//! validated after every operation and returned only if all of them succeed; the
//! first failure aborts the whole request with the index of the failing
//! operation, so callers never observe a partially patched resource.

use super::operation::{PatchOp, PatchOperation, PathExpression};
use crate::attributes::{AttributeReference, ResolvedAttribute, resolve_reference};
use crate::config::{EngineConfig, FilterConfig, PatchConfig};
use crate::error::{PatchError, PatchFailure, PatchResult, ValidationError};
use crate::filter::{Filter, matches_element};
use crate::resource::Resource;
use crate::resource::resource::{find_key, type_name};
use crate::schema::{AttributeDefinition, OperationContext, ResourceSchema, validate_resource};

use log::{debug, trace};
use serde_json::{Map, Value};

/// Apply operations with the default configuration (strict removal).
///
/// ```rust
/// use scim_engine::patch::{PatchOperation, apply};
/// use scim_engine::schema::SchemaRegistry;
/// use scim_engine::Resource;
/// use serde_json::json;
///
/// let registry = SchemaRegistry::default();
/// let users = registry.resource_schema("User").unwrap();
/// let user = Resource::from_json("User", json!({
///     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
///     "userName": "bjensen"
/// })).unwrap();
///
/// let patched = apply(&user, &[PatchOperation::add(Some("name.givenName"), json!("Bob"))], &users).unwrap();
/// assert_eq!(patched.attributes["name"]["givenName"], "Bob");
/// assert!(user.attributes.get("name").is_none());
/// ```
pub fn apply(
    resource: &Resource,
    operations: &[PatchOperation],
    schema: &ResourceSchema<'_>,
) -> PatchResult<Resource> {
    PatchEngine::default().apply(resource, operations, schema)
}

/// Configured PATCH engine. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct PatchEngine {
    config: PatchConfig,
    filter: FilterConfig,
}

impl PatchEngine {
    pub fn new(config: PatchConfig, filter: FilterConfig) -> Self {
        Self { config, filter }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.patch.clone(), config.filter.clone())
    }

    /// Apply `operations` in order, all or nothing.
    pub fn apply(
        &self,
        resource: &Resource,
        operations: &[PatchOperation],
        schema: &ResourceSchema<'_>,
    ) -> PatchResult<Resource> {
        let mut working = resource.clone();

        for (index, operation) in operations.iter().enumerate() {
            trace!(
                "Applying patch operation {} ({} {:?}) to {} {:?}",
                index, operation.op, operation.path, resource.resource_type, resource.id
            );
            self.apply_operation(&mut working, operation, schema)
                .map_err(|reason| PatchError::new(index, reason))?;
            validate_resource(schema, &working, OperationContext::Patch)
                .map_err(|e| PatchError::new(index, e))?;
        }

        // Operations may pass through a state without a required attribute,
        // but the result must still carry every one the input had.
        if let Some(last) = operations.len().checked_sub(1) {
            if validate_resource(schema, resource, OperationContext::Replace).is_ok() {
                validate_resource(schema, &working, OperationContext::Replace)
                    .map_err(|e| PatchError::new(last, e))?;
            }
        }

        debug!(
            "Applied {} patch operations to {} {:?}",
            operations.len(),
            resource.resource_type,
            resource.id
        );
        Ok(working)
    }

    fn apply_operation<'s>(
        &self,
        working: &mut Resource,
        operation: &PatchOperation,
        schema: &ResourceSchema<'s>,
    ) -> Result<(), PatchFailure> {
        match operation.op {
            PatchOp::Remove => {
                let path = operation.path.as_deref().ok_or_else(|| PatchFailure::MissingPath {
                    op: operation.op.to_string(),
                })?;
                let target = self.target(path, schema)?;
                self.remove(working, &target)
            }
            PatchOp::Add | PatchOp::Replace => {
                let value = operation.value.as_ref().ok_or_else(|| PatchFailure::MissingValue {
                    op: operation.op.to_string(),
                })?;
                match &operation.path {
                    None => self.merge(working, value, schema, operation.op),
                    Some(path) => {
                        let target = self.target(path, schema)?;
                        self.assign(working, &target, value, operation.op)
                    }
                }
            }
        }
    }

    fn target<'s>(
        &self,
        path: &str,
        schema: &ResourceSchema<'s>,
    ) -> Result<Target<'s>, PatchFailure> {
        let expression =
            PathExpression::parse(path, &self.filter).map_err(|e| PatchFailure::InvalidPath {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        let resolved = resolve_reference(&expression.attribute, schema)?;
        if expression.filter.is_some() && !resolved.attribute.is_multi_valued_complex() {
            return Err(PatchFailure::InvalidPath {
                path: path.to_string(),
                message: format!(
                    "value filters apply only to multi-valued complex attributes, '{}' is not one",
                    resolved.attribute.name
                ),
            });
        }
        Ok(Target {
            resolved,
            filter: expression.filter,
            path: path.to_string(),
        })
    }

    /// `add`/`replace` without a path: each key of `value` is a target of its own.
    fn merge(
        &self,
        working: &mut Resource,
        value: &Value,
        schema: &ResourceSchema<'_>,
        op: PatchOp,
    ) -> Result<(), PatchFailure> {
        let obj = as_object(value, "value")?;
        for (key, item) in obj {
            if key.eq_ignore_ascii_case("schemas") {
                continue;
            }
            if let Some(extension) = schema.extension(key) {
                for (name, sub_value) in as_object(item, key)? {
                    let reference =
                        AttributeReference::new(Some(extension.id.as_str()), name.clone(), None);
                    self.assign(working, &Target::resolve(&reference, schema)?, sub_value, op)?;
                }
                continue;
            }
            let reference: AttributeReference = key.parse()?;
            self.assign(working, &Target::resolve(&reference, schema)?, item, op)?;
        }
        Ok(())
    }

    fn assign(
        &self,
        working: &mut Resource,
        target: &Target<'_>,
        value: &Value,
        op: PatchOp,
    ) -> Result<(), PatchFailure> {
        let attribute = target.resolved.attribute;
        let existing = target.current(working);

        if target.filter.is_some() {
            let mut items = into_items(existing);
            let indices = target.matching(&items)?;
            if indices.is_empty() {
                return Err(target.no_target());
            }
            for index in indices {
                match target.resolved.sub_attribute {
                    Some(sub) => {
                        set_sub_attribute(&mut items[index], sub, value.clone(), &target.path)?
                    }
                    None if op == PatchOp::Replace => {
                        as_object(value, &target.path)?;
                        guard_element(attribute, &items[index], value, &target.path)?;
                        items[index] = value.clone();
                    }
                    None => merge_element(&mut items[index], attribute, value, &target.path)?,
                }
            }
            return target.store_items(working, items);
        }

        if let Some(sub) = target.resolved.sub_attribute {
            guard(attribute, existing.as_ref(), &target.path)?;
            if attribute.multi_valued {
                let mut items = into_items(existing);
                if items.is_empty() {
                    return Err(target.no_target());
                }
                for item in &mut items {
                    set_sub_attribute(item, sub, value.clone(), &target.path)?;
                }
                return target.store_items(working, items);
            }
            let mut element = existing.unwrap_or_else(|| Value::Object(Map::new()));
            set_sub_attribute(&mut element, sub, value.clone(), &target.path)?;
            return target.store(working, element);
        }

        guard(attribute, existing.as_ref(), &target.path)?;
        if attribute.multi_valued {
            let mut items = match op {
                PatchOp::Replace => Vec::new(),
                _ => into_items(existing),
            };
            match value {
                Value::Array(values) => items.extend(values.iter().cloned()),
                other => items.push(other.clone()),
            }
            target.store_items(working, items)
        } else if attribute.is_complex() {
            let mut element = existing.unwrap_or_else(|| Value::Object(Map::new()));
            merge_element(&mut element, attribute, value, &target.path)?;
            target.store(working, element)
        } else {
            target.store(working, value.clone())
        }
    }

    fn remove(&self, working: &mut Resource, target: &Target<'_>) -> Result<(), PatchFailure> {
        let attribute = target.resolved.attribute;
        let Some(existing) = target.current(working) else {
            return self.nothing_removed(target);
        };

        match (&target.filter, target.resolved.sub_attribute) {
            (Some(_), None) => {
                guard(attribute, Some(&existing), &target.path)?;
                let items = into_items(Some(existing));
                let indices = target.matching(&items)?;
                if indices.is_empty() {
                    return self.nothing_removed(target);
                }
                let remaining = items
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| !indices.contains(index))
                    .map(|(_, item)| item)
                    .collect();
                target.store_items(working, remaining)
            }
            (Some(_), Some(sub)) => {
                let mut items = into_items(Some(existing));
                let indices = target.matching(&items)?;
                if indices.is_empty() {
                    return self.nothing_removed(target);
                }
                for index in indices {
                    set_sub_attribute(&mut items[index], sub, Value::Null, &target.path)?;
                }
                target.store_items(working, items)
            }
            (None, Some(sub)) => {
                let mut items = match existing {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                let mut removed = false;
                for item in &mut items {
                    if item.as_object().is_some_and(|obj| find_key(obj, &sub.name).is_some()) {
                        set_sub_attribute(item, sub, Value::Null, &target.path)?;
                        removed = true;
                    }
                }
                if !removed {
                    return self.nothing_removed(target);
                }
                if attribute.multi_valued {
                    target.store_items(working, items)
                } else {
                    match items.pop() {
                        Some(Value::Object(obj)) if !obj.is_empty() => {
                            target.store(working, Value::Object(obj))
                        }
                        _ => {
                            target.clear(working);
                            Ok(())
                        }
                    }
                }
            }
            (None, None) => {
                guard(attribute, Some(&existing), &target.path)?;
                target.clear(working);
                Ok(())
            }
        }
    }

    fn nothing_removed(&self, target: &Target<'_>) -> Result<(), PatchFailure> {
        if self.config.strict_remove {
            Err(target.no_target())
        } else {
            trace!("Removal at '{}' matched nothing", target.path);
            Ok(())
        }
    }
}

/// A resolved operation path.
struct Target<'s> {
    resolved: ResolvedAttribute<'s>,
    filter: Option<Filter>,
    path: String,
}

impl<'s> Target<'s> {
    fn resolve(
        reference: &AttributeReference,
        schema: &ResourceSchema<'s>,
    ) -> Result<Self, PatchFailure> {
        Ok(Self {
            resolved: resolve_reference(reference, schema)?,
            filter: None,
            path: reference.to_string(),
        })
    }

    fn current(&self, working: &Resource) -> Option<Value> {
        working
            .get(self.resolved.extension(), &self.resolved.attribute.name)
            .map(|value| value.into_owned())
    }

    fn store(&self, working: &mut Resource, value: Value) -> Result<(), PatchFailure> {
        working.set(self.resolved.extension(), &self.resolved.attribute.name, value)?;
        Ok(())
    }

    /// Store a collection; an empty collection removes the attribute.
    fn store_items(&self, working: &mut Resource, items: Vec<Value>) -> Result<(), PatchFailure> {
        let items: Vec<Value> = items
            .into_iter()
            .filter(|item| !matches!(item, Value::Object(obj) if obj.is_empty()))
            .collect();
        if items.is_empty() {
            self.clear(working);
            return Ok(());
        }
        self.store(working, Value::Array(items))
    }

    fn clear(&self, working: &mut Resource) {
        working.remove(self.resolved.extension(), &self.resolved.attribute.name);
    }

    /// Indices of the elements selected by the value filter (all, without one).
    fn matching(&self, items: &[Value]) -> Result<Vec<usize>, PatchFailure> {
        let Some(filter) = &self.filter else {
            return Ok((0..items.len()).collect());
        };
        let mut indices = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if matches_element(filter, item, self.resolved.attribute)? {
                indices.push(index);
            }
        }
        Ok(indices)
    }

    fn no_target(&self) -> PatchFailure {
        PatchFailure::NoSuchTarget {
            path: self.path.clone(),
        }
    }
}

/// Read-only and immutable attributes cannot change once they hold a value.
fn guard(
    def: &AttributeDefinition,
    existing: Option<&Value>,
    path: &str,
) -> Result<(), PatchFailure> {
    if def.mutability.is_protected() && existing.is_some_and(has_value) {
        return Err(PatchFailure::AttemptToModifyImmutable {
            attribute: path.to_string(),
            mutability: def.mutability.to_string(),
        });
    }
    Ok(())
}

/// Replacing a whole element must keep its protected sub-attributes unchanged.
fn guard_element(
    def: &AttributeDefinition,
    old: &Value,
    new: &Value,
    path: &str,
) -> Result<(), PatchFailure> {
    let (Some(old), Some(new)) = (old.as_object(), new.as_object()) else {
        return Ok(());
    };
    for sub in def.sub_attributes.iter().filter(|sub| sub.mutability.is_protected()) {
        let before = find_key(old, &sub.name).map(|key| &old[key]);
        let after = find_key(new, &sub.name).map(|key| &new[key]);
        if before.is_some_and(has_value) && before != after {
            return Err(PatchFailure::AttemptToModifyImmutable {
                attribute: format!("{}.{}", path, sub.name),
                mutability: sub.mutability.to_string(),
            });
        }
    }
    Ok(())
}

/// Set (or with `null`, remove) one sub-attribute of a complex element.
fn set_sub_attribute(
    element: &mut Value,
    sub: &AttributeDefinition,
    value: Value,
    path: &str,
) -> Result<(), PatchFailure> {
    let actual = type_name(element);
    let obj = element
        .as_object_mut()
        .ok_or_else(|| ValidationError::invalid_type(path, "object", actual))?;
    let key = find_key(obj, &sub.name).map(str::to_string);
    guard(sub, key.as_ref().and_then(|key| obj.get(key)), path)?;
    if let Some(key) = key {
        obj.remove(&key);
    }
    if !value.is_null() {
        obj.insert(sub.name.clone(), value);
    }
    Ok(())
}

/// Merge the sub-attributes in `value` into a complex element.
fn merge_element(
    element: &mut Value,
    def: &AttributeDefinition,
    value: &Value,
    path: &str,
) -> Result<(), PatchFailure> {
    for (name, sub_value) in as_object(value, path)? {
        let sub = def
            .sub_attribute(name)
            .ok_or_else(|| ValidationError::UnknownSubAttribute {
                attribute: def.name.clone(),
                sub_attribute: name.clone(),
            })?;
        set_sub_attribute(element, sub, sub_value.clone(), path)?;
    }
    Ok(())
}

fn as_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, PatchFailure> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid_type(path, "object", type_name(value)).into())
}

fn into_items(value: Option<Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
        _ => true,
    }
}
