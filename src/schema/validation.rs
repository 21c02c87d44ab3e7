//! Schema validation logic for SCIM resources.
//!
//! Two kinds of checks live here: structural checks of schema definitions
//! (run when a registry is built) and checks of resource values against the
//! schemas of their resource type (run on create/replace and at the end of
//! every PATCH).

use super::registry::ResourceSchema;
use super::types::{AttributeDefinition, AttributeType, Mutability, Schema};
use crate::error::{ValidationError, ValidationResult};
use crate::resource::Resource;
use crate::resource::resource::type_name;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Which operation the resource is being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationContext {
    /// Resource creation: required attributes must be present
    Create,
    /// Full replacement: required attributes must be present
    Replace,
    /// Result of a PATCH: shape and types only
    Patch,
}

/// Check the structural rules of a schema definition.
///
/// Attribute names must be unique (case-insensitively) at every level and
/// `subAttributes` must be non-empty exactly when the type is `complex`.
pub fn validate_schema_definition(schema: &Schema) -> ValidationResult<()> {
    if !(schema.id.starts_with("urn:") || schema.id.starts_with("http")) {
        return Err(ValidationError::InvalidSchema {
            schema_id: schema.id.clone(),
            message: "schema id must be a URN or URL".to_string(),
        });
    }
    check_attribute_list(&schema.id, "", &schema.attributes)
}

fn check_attribute_list(
    schema_id: &str,
    parent: &str,
    attributes: &[AttributeDefinition],
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for attr in attributes {
        let path = if parent.is_empty() {
            attr.name.clone()
        } else {
            format!("{}.{}", parent, attr.name)
        };
        let invalid = |message: String| ValidationError::InvalidSchema {
            schema_id: schema_id.to_string(),
            message,
        };

        if attr.name.is_empty() {
            return Err(invalid(format!("empty attribute name under '{}'", parent)));
        }
        if !seen.insert(attr.name.to_ascii_lowercase()) {
            return Err(invalid(format!("duplicate attribute '{}'", path)));
        }
        match (attr.is_complex(), attr.sub_attributes.is_empty()) {
            (true, true) => {
                return Err(invalid(format!("complex attribute '{}' has no sub-attributes", path)));
            }
            (false, false) => {
                return Err(invalid(format!(
                    "attribute '{}' of type {} cannot have sub-attributes",
                    path, attr.data_type
                )));
            }
            _ => {}
        }
        if !parent.is_empty() && attr.is_complex() {
            return Err(invalid(format!("nested complex attribute '{}'", path)));
        }
        check_attribute_list(schema_id, &path, &attr.sub_attributes)?;
    }
    Ok(())
}

/// Validate a resource against the schemas of its resource type.
pub fn validate_resource(
    schema: &ResourceSchema<'_>,
    resource: &Resource,
    context: OperationContext,
) -> ValidationResult<()> {
    for uri in &resource.schemas {
        if schema.schema(uri).is_none() {
            return Err(ValidationError::UnknownSchemaUri { uri: uri.clone() });
        }
    }

    check_attributes(schema.core(), &resource.attributes)?;
    if let Some(external_id) = &resource.external_id {
        if let Some(def) = schema.core().attribute("externalId") {
            validate_value(def, "externalId", &Value::String(external_id.clone()))?;
        }
    }

    for (urn, attributes) in &resource.extensions {
        let ext = schema
            .extension(urn)
            .ok_or_else(|| ValidationError::UnknownSchemaUri { uri: urn.clone() })?;
        check_attributes(ext, attributes)?;
    }

    if matches!(context, OperationContext::Create | OperationContext::Replace) {
        check_required(schema.core(), &resource.attributes)?;
        for ext in &schema.resource_type().schema_extensions {
            match resource.extension(&ext.schema) {
                Some(attributes) => {
                    if let Some(ext_schema) = schema.extension(&ext.schema) {
                        check_required(ext_schema, attributes)?;
                    }
                }
                None if ext.required => {
                    return Err(ValidationError::missing_required(&ext.schema));
                }
                None => {}
            }
        }
    }

    Ok(())
}

fn check_attributes(schema: &Schema, attributes: &Map<String, Value>) -> ValidationResult<()> {
    for (name, value) in attributes {
        let def = schema
            .attribute(name)
            .ok_or_else(|| ValidationError::UnknownAttribute {
                attribute: name.clone(),
                schema_id: schema.id.clone(),
            })?;
        validate_value(def, &def.name, value)?;
    }
    Ok(())
}

fn check_required(schema: &Schema, attributes: &Map<String, Value>) -> ValidationResult<()> {
    for def in &schema.attributes {
        // id and meta are required but supplied by the server
        if !def.required || def.mutability == Mutability::ReadOnly {
            continue;
        }
        if !attributes.keys().any(|k| k.eq_ignore_ascii_case(&def.name)) {
            return Err(ValidationError::missing_required(&def.name));
        }
    }
    Ok(())
}

/// Validate a complete attribute value (array for multi-valued attributes).
pub fn validate_value(
    def: &AttributeDefinition,
    path: &str,
    value: &Value,
) -> ValidationResult<()> {
    if value.is_null() {
        return Ok(());
    }
    if def.multi_valued {
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::ExpectedMultiValue {
                attribute: path.to_string(),
            })?;
        items
            .iter()
            .try_for_each(|item| validate_single_value(def, path, item))
    } else {
        if value.is_array() {
            return Err(ValidationError::ExpectedSingleValue {
                attribute: path.to_string(),
            });
        }
        validate_single_value(def, path, value)
    }
}

/// Validate one value (one element, for multi-valued attributes) against its type.
pub fn validate_single_value(
    def: &AttributeDefinition,
    path: &str,
    value: &Value,
) -> ValidationResult<()> {
    let mismatch =
        || ValidationError::invalid_type(path, def.data_type.to_string(), type_name(value));

    match def.data_type {
        AttributeType::String | AttributeType::Reference => {
            value.as_str().ok_or_else(mismatch)?;
        }
        AttributeType::Boolean => {
            value.as_bool().ok_or_else(mismatch)?;
        }
        AttributeType::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                return Err(mismatch());
            }
        }
        AttributeType::Decimal => {
            if !value.is_number() {
                return Err(mismatch());
            }
        }
        AttributeType::DateTime => {
            let text = value.as_str().ok_or_else(mismatch)?;
            DateTime::<FixedOffset>::parse_from_rfc3339(text).map_err(|_| {
                ValidationError::InvalidDateTimeFormat {
                    attribute: path.to_string(),
                    value: text.to_string(),
                }
            })?;
        }
        AttributeType::Binary => {
            let text = value.as_str().ok_or_else(mismatch)?;
            BASE64
                .decode(text)
                .map_err(|e| ValidationError::InvalidBinaryData {
                    attribute: path.to_string(),
                    details: e.to_string(),
                })?;
        }
        AttributeType::Complex => {
            let obj = value.as_object().ok_or_else(mismatch)?;
            for (name, sub_value) in obj {
                let sub = def
                    .sub_attribute(name)
                    .ok_or_else(|| ValidationError::UnknownSubAttribute {
                        attribute: path.to_string(),
                        sub_attribute: name.clone(),
                    })?;
                validate_value(sub, &format!("{}.{}", path, sub.name), sub_value)?;
            }
        }
    }
    Ok(())
}
