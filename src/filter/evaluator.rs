//! Filter evaluation against resources and multi-valued attribute elements.
//!
//! Attribute access is driven by the schema: every reference is resolved to
//! its definition first, which supplies the data type and `caseExact` flag used
//! for the comparison. Evaluation is read-only.

use super::ast::{CompareOp, Filter, FilterValue};
use crate::attributes::{AttributeReference, resolve_reference};
use crate::error::{FilterError, FilterResult};
use crate::resource::Resource;
use crate::resource::resource::find_key;
use crate::schema::{AttributeDefinition, AttributeType, ResourceSchema};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluate a filter against a resource.
///
/// ```rust
/// use scim_engine::filter::{matches, parse};
/// use scim_engine::schema::SchemaRegistry;
/// use scim_engine::Resource;
/// use serde_json::json;
///
/// let registry = SchemaRegistry::default();
/// let users = registry.resource_schema("User").unwrap();
/// let user = Resource::from_json("User", json!({
///     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
///     "userName": "BJensen"
/// })).unwrap();
///
/// let filter = parse(r#"userName eq "bjensen""#).unwrap();
/// assert!(matches(&filter, &user, &users).unwrap());
/// ```
pub fn matches(
    filter: &Filter,
    resource: &Resource,
    schema: &ResourceSchema<'_>,
) -> FilterResult<bool> {
    Scope::Resource { resource, schema }.eval(filter)
}

/// Evaluate a filter against one element of a multi-valued complex attribute.
///
/// Attribute references in `filter` name sub-attributes of `parent`.
pub fn matches_element(
    filter: &Filter,
    element: &Value,
    parent: &AttributeDefinition,
) -> FilterResult<bool> {
    Scope::Element { element, parent }.eval(filter)
}

enum Scope<'a, 's> {
    Resource {
        resource: &'a Resource,
        schema: &'a ResourceSchema<'s>,
    },
    Element {
        element: &'a Value,
        parent: &'a AttributeDefinition,
    },
}

/// Values selected by an attribute reference, with the definition that types them.
struct Selected<'d> {
    def: &'d AttributeDefinition,
    values: Vec<Value>,
}

impl<'a, 's> Scope<'a, 's> {
    fn eval(&self, filter: &Filter) -> FilterResult<bool> {
        match filter {
            Filter::And(left, right) => Ok(self.eval(left)? && self.eval(right)?),
            Filter::Or(left, right) => Ok(self.eval(left)? || self.eval(right)?),
            Filter::Not(inner) => Ok(!self.eval(inner)?),
            Filter::Group(inner) => self.eval(inner),
            Filter::Present(attribute) => {
                let selected = self.select(attribute)?;
                Ok(selected.values.iter().any(is_present))
            }
            Filter::Comparison {
                attribute,
                op,
                value,
            } => {
                let selected = self.select(attribute)?;
                let (def, values) = comparable(selected)?;
                check_operator(def, *op, value)?;
                for actual in &values {
                    if compare(def, *op, actual, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Complex { attribute, filter } => {
                let Scope::Resource { .. } = self else {
                    return Err(FilterError::evaluation(format!(
                        "value filter on '{}' cannot be nested inside another value filter",
                        attribute
                    )));
                };
                let selected = self.select(attribute)?;
                if !selected.def.is_multi_valued_complex()
                    || attribute.sub_attribute_name.is_some()
                {
                    return Err(FilterError::evaluation(format!(
                        "value filter requires a multi-valued complex attribute, '{}' is not one",
                        attribute
                    )));
                }
                for element in &selected.values {
                    if matches_element(filter, element, selected.def)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Resolve a reference and collect its values. Multi-valued attributes are
    /// flattened so each element is a candidate on its own.
    fn select(&self, attribute: &AttributeReference) -> FilterResult<Selected<'a>> {
        match self {
            Scope::Resource { resource, schema } => {
                let resolved = resolve_reference(attribute, schema)
                    .map_err(|e| FilterError::evaluation(e.to_string()))?;
                let mut values = Vec::new();
                if let Some(value) = resource.get(resolved.extension(), &resolved.attribute.name) {
                    collect(value.as_ref(), resolved.sub_attribute, &mut values);
                }
                Ok(Selected {
                    def: resolved.target(),
                    values,
                })
            }
            Scope::Element { element, parent } => {
                let parent: &'a AttributeDefinition = *parent;
                if attribute.schema_urn.is_some() || attribute.sub_attribute_name.is_some() {
                    return Err(FilterError::evaluation(format!(
                        "'{}' must name a sub-attribute of '{}'",
                        attribute, parent.name
                    )));
                }
                let def = parent.sub_attribute(&attribute.attribute_name).ok_or_else(|| {
                    FilterError::evaluation(format!(
                        "unknown sub-attribute '{}' of '{}'",
                        attribute.attribute_name, parent.name
                    ))
                })?;
                let mut values = Vec::new();
                if let Some(obj) = element.as_object() {
                    if let Some(key) = find_key(obj, &def.name) {
                        collect(&obj[key], None, &mut values);
                    }
                }
                Ok(Selected { def, values })
            }
        }
    }
}

fn collect(value: &Value, sub: Option<&AttributeDefinition>, out: &mut Vec<Value>) {
    match (value, sub) {
        (Value::Array(items), _) => items.iter().for_each(|item| collect(item, sub, out)),
        (Value::Object(obj), Some(sub)) => {
            if let Some(key) = find_key(obj, &sub.name) {
                collect(&obj[key], None, out);
            }
        }
        (Value::Null, _) => {}
        (other, None) => out.push(other.clone()),
        (_, Some(_)) => {}
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(is_present),
        Value::Object(obj) => obj.values().any(is_present),
        _ => true,
    }
}

/// Comparing a complex attribute compares its `value` sub-attribute.
fn comparable(selected: Selected<'_>) -> FilterResult<(&AttributeDefinition, Vec<Value>)> {
    if !selected.def.is_complex() {
        return Ok((selected.def, selected.values));
    }
    let value_def = selected.def.sub_attribute("value").ok_or_else(|| {
        FilterError::evaluation(format!(
            "complex attribute '{}' has no 'value' to compare",
            selected.def.name
        ))
    })?;
    let mut values = Vec::new();
    for element in &selected.values {
        collect(element, Some(value_def), &mut values);
    }
    Ok((value_def, values))
}

/// Reject operator/type combinations up front, before looking at any value.
fn check_operator(
    def: &AttributeDefinition,
    op: CompareOp,
    literal: &FilterValue,
) -> FilterResult<()> {
    if op.is_ordering() {
        if !def.data_type.is_ordinal() {
            return Err(FilterError::evaluation(format!(
                "operator '{}' cannot be applied to {} attribute '{}'",
                op, def.data_type, def.name
            )));
        }
        let compatible = match def.data_type {
            AttributeType::DateTime => {
                matches!(literal, FilterValue::String(s) if parse_datetime(s).is_some())
            }
            _ => matches!(literal, FilterValue::Number(_)),
        };
        if !compatible {
            return Err(FilterError::evaluation(format!(
                "operator '{}' on {} attribute '{}' needs a {} value, got {}",
                op, def.data_type, def.name, def.data_type, literal
            )));
        }
    }
    if op.is_substring() {
        if !matches!(def.data_type, AttributeType::String | AttributeType::Reference) {
            return Err(FilterError::evaluation(format!(
                "operator '{}' cannot be applied to {} attribute '{}'",
                op, def.data_type, def.name
            )));
        }
        if !matches!(literal, FilterValue::String(_)) {
            return Err(FilterError::evaluation(format!(
                "operator '{}' needs a string value, got {}",
                op, literal
            )));
        }
    }
    Ok(())
}

fn compare(
    def: &AttributeDefinition,
    op: CompareOp,
    actual: &Value,
    literal: &FilterValue,
) -> FilterResult<bool> {
    match op {
        CompareOp::Eq => Ok(equals(def, actual, literal)),
        CompareOp::Ne => Ok(!equals(def, actual, literal)),
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew => {
            let (Some(actual), FilterValue::String(expected)) = (actual.as_str(), literal) else {
                return Ok(false);
            };
            let (actual, expected) = fold_case(def, actual, expected);
            Ok(match op {
                CompareOp::Co => actual.contains(expected.as_str()),
                CompareOp::Sw => actual.starts_with(expected.as_str()),
                _ => actual.ends_with(expected.as_str()),
            })
        }
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
            let Some(ordering) = order(def, actual, literal) else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
                CompareOp::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
    }
}

fn equals(def: &AttributeDefinition, actual: &Value, literal: &FilterValue) -> bool {
    match (actual, literal) {
        (_, FilterValue::Null) => false,
        (Value::String(a), FilterValue::String(b)) if def.data_type == AttributeType::DateTime => {
            match (parse_datetime(a), parse_datetime(b)) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            }
        }
        (Value::String(a), FilterValue::String(b)) => {
            let (a, b) = fold_case(def, a, b);
            a == b
        }
        (Value::Bool(a), FilterValue::Boolean(b)) => a == b,
        (Value::Number(a), FilterValue::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => false,
    }
}

fn order(def: &AttributeDefinition, actual: &Value, literal: &FilterValue) -> Option<Ordering> {
    match (def.data_type, actual, literal) {
        (AttributeType::DateTime, Value::String(a), FilterValue::String(b)) => {
            Some(parse_datetime(a)?.cmp(&parse_datetime(b)?))
        }
        (_, Value::Number(a), FilterValue::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        _ => None,
    }
}

fn fold_case(def: &AttributeDefinition, actual: &str, expected: &str) -> (String, String) {
    if def.case_exact {
        (actual.to_string(), expected.to_string())
    } else {
        (actual.to_lowercase(), expected.to_lowercase())
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}
