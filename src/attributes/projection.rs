//! Attribute projection: shaping a resource for a response.
//!
//! Visibility of every attribute is decided from its `returned` policy and the
//! request's include or exclude set:
//!
//! | returned  | no selection | include set              | exclude set          |
//! |-----------|--------------|--------------------------|----------------------|
//! | `always`  | shown        | shown                    | shown                |
//! | `never`   | hidden       | hidden                   | hidden               |
//! | `default` | shown        | shown only if named      | hidden if named      |
//! | `request` | hidden       | shown only if named      | hidden               |
//!
//! Sub-attributes follow their parent unless named explicitly themselves.

use super::reference::{AttributeReference, parse_attribute_list};
use super::resolver::resolve;
use crate::error::{ScimError, ScimResult};
use crate::resource::{Meta, Resource};
use crate::schema::{AttributeDefinition, ResourceSchema, Returned, Schema};

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A resolved `attributes` / `excludedAttributes` selection.
///
/// At most one of the two sets is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSelection {
    include: BTreeSet<AttributeReference>,
    exclude: BTreeSet<AttributeReference>,
}

impl AttributeSelection {
    /// No selection: every `default` attribute is returned.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a selection from the raw comma-separated request parameters.
    ///
    /// Supplying both parameters is rejected.
    pub fn from_params(
        attributes: Option<&str>,
        excluded_attributes: Option<&str>,
        schema: &ResourceSchema<'_>,
    ) -> ScimResult<Self> {
        let include = attributes.map(parse_attribute_list).unwrap_or_default();
        let exclude = excluded_attributes
            .map(parse_attribute_list)
            .unwrap_or_default();
        Self::from_tokens(&include, &exclude, schema)
    }

    /// Build a selection from already-split attribute tokens.
    pub fn from_tokens(
        include: &[String],
        exclude: &[String],
        schema: &ResourceSchema<'_>,
    ) -> ScimResult<Self> {
        validate_selection(include, exclude)?;
        Ok(Self {
            include: resolve(include, schema)?,
            exclude: resolve(exclude, schema)?,
        })
    }

    /// Wrap resolved references.
    pub fn new(
        include: BTreeSet<AttributeReference>,
        exclude: BTreeSet<AttributeReference>,
    ) -> ScimResult<Self> {
        if !include.is_empty() && !exclude.is_empty() {
            return Err(both_selected());
        }
        Ok(Self { include, exclude })
    }

    pub fn include(&self) -> &BTreeSet<AttributeReference> {
        &self.include
    }

    pub fn exclude(&self) -> &BTreeSet<AttributeReference> {
        &self.exclude
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Project a resource through this selection.
    pub fn apply(&self, resource: &Resource, schema: &ResourceSchema<'_>) -> Resource {
        project(resource, schema, &self.include, &self.exclude)
    }
}

/// Reject requests that carry both an include and an exclude list.
pub fn validate_selection<S: AsRef<str>>(include: &[S], exclude: &[S]) -> ScimResult<()> {
    if !include.is_empty() && !exclude.is_empty() {
        return Err(both_selected());
    }
    Ok(())
}

fn both_selected() -> ScimError {
    ScimError::invalid_request(
        "Cannot include both attributes and excluded attributes in a single request",
    )
}

/// Compute the response form of `resource`.
///
/// `include` and `exclude` must be canonical references (as produced by
/// [`resolve`]) and must not both be non-empty. The result shares no data with
/// the input; attributes missing from the schema are dropped.
pub fn project(
    resource: &Resource,
    schema: &ResourceSchema<'_>,
    include: &BTreeSet<AttributeReference>,
    exclude: &BTreeSet<AttributeReference>,
) -> Resource {
    debug_assert!(include.is_empty() || exclude.is_empty());
    let selection = Selection { include, exclude };
    let core = schema.core();

    let mut projected = Resource {
        resource_type: resource.resource_type.clone(),
        schemas: resource.schemas.clone(),
        id: None,
        external_id: None,
        meta: None,
        attributes: Map::new(),
        extensions: BTreeMap::new(),
    };

    if let Some(id) = &resource.id {
        let shown = match core.attribute("id") {
            Some(def) => selection.top_level(core, def).is_some(),
            None => true,
        };
        if shown {
            projected.id = Some(id.clone());
        }
    }
    if let (Some(external_id), Some(def)) = (&resource.external_id, core.attribute("externalId")) {
        if selection.top_level(core, def).is_some() {
            projected.external_id = Some(external_id.clone());
        }
    }
    if let (Some(meta), Some(def)) = (&resource.meta, core.attribute("meta")) {
        if let Some(reference) = selection.top_level(core, def) {
            if let Some(value) = selection.value(def, &reference, &meta.to_value()) {
                projected.meta = Meta::from_value(&value).ok();
            }
        }
    }

    projected.attributes = selection.attributes(core, &resource.attributes);

    for extension in schema.extensions() {
        let Some(attributes) = resource.extension(&extension.id) else {
            continue;
        };
        let shown = selection.attributes(extension, attributes);
        if !shown.is_empty() {
            projected.extensions.insert(extension.id.clone(), shown);
        }
    }

    projected
}

struct Selection<'s> {
    include: &'s BTreeSet<AttributeReference>,
    exclude: &'s BTreeSet<AttributeReference>,
}

impl Selection<'_> {
    fn attributes(&self, schema: &Schema, attributes: &Map<String, Value>) -> Map<String, Value> {
        let mut shown = Map::new();
        for def in &schema.attributes {
            let Some((_, value)) = attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&def.name))
            else {
                continue;
            };
            let Some(reference) = self.top_level(schema, def) else {
                continue;
            };
            if let Some(value) = self.value(def, &reference, value) {
                shown.insert(def.name.clone(), value);
            }
        }
        shown
    }

    /// Decide a top-level attribute; returns its canonical reference when shown.
    fn top_level(&self, schema: &Schema, def: &AttributeDefinition) -> Option<AttributeReference> {
        let reference = AttributeReference::new(Some(schema.id.as_str()), def.name.clone(), None);
        let named = self.include.contains(&reference)
            || self.include.iter().any(|r| r.same_attribute(&reference));

        let shown = match def.returned {
            Returned::Always => true,
            Returned::Never => false,
            Returned::Default if self.include.is_empty() => !self.exclude.contains(&reference),
            Returned::Default | Returned::Request => named,
        };
        shown.then_some(reference)
    }

    /// Project the value of a shown attribute, filtering complex sub-attributes.
    fn value(
        &self,
        def: &AttributeDefinition,
        reference: &AttributeReference,
        value: &Value,
    ) -> Option<Value> {
        if !def.is_complex() {
            return Some(value.clone());
        }

        let whole = def.returned == Returned::Always
            || self.include.is_empty()
            || self.include.contains(reference);

        match value {
            Value::Array(items) => {
                let items: Vec<Value> = items
                    .iter()
                    .filter_map(|item| item.as_object())
                    .map(|obj| self.sub_attributes(def, reference, whole, obj))
                    .filter(|obj| !obj.is_empty())
                    .map(Value::Object)
                    .collect();
                (!items.is_empty()).then_some(Value::Array(items))
            }
            Value::Object(obj) => {
                let obj = self.sub_attributes(def, reference, whole, obj);
                (!obj.is_empty()).then_some(Value::Object(obj))
            }
            _ => None,
        }
    }

    fn sub_attributes(
        &self,
        def: &AttributeDefinition,
        parent: &AttributeReference,
        whole: bool,
        obj: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut shown = Map::new();
        for sub in &def.sub_attributes {
            let Some((_, value)) = obj.iter().find(|(key, _)| key.eq_ignore_ascii_case(&sub.name))
            else {
                continue;
            };
            let reference = parent.with_sub_attribute(&sub.name);
            let visible = match sub.returned {
                Returned::Always => true,
                Returned::Never => false,
                Returned::Default => {
                    (whole || self.include.contains(&reference))
                        && !self.exclude.contains(&reference)
                }
                Returned::Request => self.include.contains(&reference),
            };
            if visible {
                shown.insert(sub.name.clone(), value.clone());
            }
        }
        shown
    }
}
