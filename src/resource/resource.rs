//! Core SCIM resource representation.
//!
//! A [`Resource`] is a schema-typed value tree: core attributes keyed by name,
//! extension attributes keyed by extension URN and then by name, plus the common
//! attributes `id`, `externalId` and `meta` held in dedicated fields. Values are
//! `serde_json::Value`, i.e. a tagged variant of scalar, list and nested mapping.
//!
//! Attribute names are matched case-insensitively. All reads and writes used by
//! the engines go through [`Resource::get`], [`Resource::set`] and
//! [`Resource::remove`], which route the common attributes to their fields.

use super::meta::Meta;
use crate::error::{ValidationError, ValidationResult};

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Generic SCIM resource representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// The type of this resource (e.g., "User", "Group")
    pub resource_type: String,
    /// Schema URNs the resource declares (core schema first)
    pub schemas: Vec<String>,
    /// Server-assigned identifier; absent only before creation
    pub id: Option<String>,
    /// Client-assigned identifier
    pub external_id: Option<String>,
    /// Resource metadata
    pub meta: Option<Meta>,
    /// Core schema attributes other than the common ones
    pub attributes: Map<String, Value>,
    /// Extension attributes keyed by extension URN
    pub extensions: BTreeMap<String, Map<String, Value>>,
}

impl Resource {
    /// Create an empty resource of the given type declaring a core schema.
    pub fn new(resource_type: impl Into<String>, core_schema: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            schemas: vec![core_schema.into()],
            id: None,
            external_id: None,
            meta: None,
            attributes: Map::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Create a resource from its SCIM JSON representation.
    ///
    /// Top-level keys containing `:` are extension URNs and must hold objects.
    ///
    /// ```rust
    /// use scim_engine::Resource;
    /// use serde_json::json;
    ///
    /// let resource = Resource::from_json("User", json!({
    ///     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
    ///     "id": "2819c223",
    ///     "userName": "bjensen"
    /// })).unwrap();
    /// assert_eq!(resource.id.as_deref(), Some("2819c223"));
    /// ```
    pub fn from_json(resource_type: impl Into<String>, data: Value) -> ValidationResult<Self> {
        let Value::Object(obj) = data else {
            return Err(ValidationError::custom("Resource must be a JSON object"));
        };

        let mut resource = Self {
            resource_type: resource_type.into(),
            schemas: Vec::new(),
            id: None,
            external_id: None,
            meta: None,
            attributes: Map::new(),
            extensions: BTreeMap::new(),
        };

        for (key, value) in obj {
            if key.eq_ignore_ascii_case("schemas") {
                resource.schemas = parse_schemas(value)?;
            } else if key.contains(':') {
                let Value::Object(ext) = value else {
                    return Err(ValidationError::invalid_type(key, "object", type_name(&value)));
                };
                resource.extensions.insert(key, ext);
            } else {
                resource.set(None, &key, value)?;
            }
        }

        Ok(resource)
    }

    /// Serialize to SCIM JSON. Keys come out sorted, which makes the output canonical.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "schemas".to_string(),
            Value::Array(self.schemas.iter().cloned().map(Value::String).collect()),
        );
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        if let Some(external_id) = &self.external_id {
            obj.insert("externalId".to_string(), Value::String(external_id.clone()));
        }
        for (key, value) in &self.attributes {
            obj.insert(key.clone(), value.clone());
        }
        for (urn, ext) in &self.extensions {
            obj.insert(urn.clone(), Value::Object(ext.clone()));
        }
        if let Some(meta) = &self.meta {
            obj.insert("meta".to_string(), meta.to_value());
        }
        Value::Object(obj)
    }

    /// Get the resource id.
    pub fn get_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Read an attribute value.
    ///
    /// `extension` selects an extension by URN; `None` reads the core schema.
    /// Common attributes are rendered to JSON on the fly, hence the `Cow`.
    pub fn get(&self, extension: Option<&str>, name: &str) -> Option<Cow<'_, Value>> {
        match extension {
            None => match common_attribute(name) {
                Some(Common::Id) => self.id.clone().map(|id| Cow::Owned(Value::String(id))),
                Some(Common::ExternalId) => self
                    .external_id
                    .clone()
                    .map(|id| Cow::Owned(Value::String(id))),
                Some(Common::Meta) => self.meta.as_ref().map(|meta| Cow::Owned(meta.to_value())),
                None => find_key(&self.attributes, name)
                    .and_then(|key| self.attributes.get(key))
                    .map(Cow::Borrowed),
            },
            Some(urn) => {
                let ext = self.extension(urn)?;
                find_key(ext, name)
                    .and_then(|key| ext.get(key))
                    .map(Cow::Borrowed)
            }
        }
    }

    /// Whether an attribute holds a value.
    pub fn contains(&self, extension: Option<&str>, name: &str) -> bool {
        self.get(extension, name).is_some()
    }

    /// Write an attribute value under its canonical `name`, replacing any
    /// differently-cased key. `null` removes the attribute.
    pub fn set(
        &mut self,
        extension: Option<&str>,
        name: &str,
        value: Value,
    ) -> ValidationResult<()> {
        if value.is_null() {
            self.remove(extension, name);
            return Ok(());
        }

        match extension {
            None => match common_attribute(name) {
                Some(Common::Id) => self.id = Some(expect_string(name, value)?),
                Some(Common::ExternalId) => self.external_id = Some(expect_string(name, value)?),
                Some(Common::Meta) => self.meta = Some(Meta::from_value(&value)?),
                None => {
                    if let Some(key) = find_key(&self.attributes, name).map(str::to_string) {
                        self.attributes.remove(&key);
                    }
                    self.attributes.insert(name.to_string(), value);
                }
            },
            Some(urn) => {
                let key = match self.extension_key(urn) {
                    Some(key) => key,
                    None => {
                        self.extensions.insert(urn.to_string(), Map::new());
                        urn.to_string()
                    }
                };
                if !self.schemas.iter().any(|s| s.eq_ignore_ascii_case(urn)) {
                    self.schemas.push(key.clone());
                }
                let ext = self.extensions.entry(key).or_default();
                if let Some(existing) = find_key(ext, name).map(str::to_string) {
                    ext.remove(&existing);
                }
                ext.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    ///
    /// Removing the last attribute of an extension drops the extension and its URN.
    pub fn remove(&mut self, extension: Option<&str>, name: &str) -> Option<Value> {
        match extension {
            None => match common_attribute(name) {
                Some(Common::Id) => self.id.take().map(Value::String),
                Some(Common::ExternalId) => self.external_id.take().map(Value::String),
                Some(Common::Meta) => self.meta.take().map(|meta| meta.to_value()),
                None => {
                    let key = find_key(&self.attributes, name)?.to_string();
                    self.attributes.remove(&key)
                }
            },
            Some(urn) => {
                let ext_key = self.extension_key(urn)?;
                let ext = self.extensions.get_mut(&ext_key)?;
                let key = find_key(ext, name)?.to_string();
                let removed = ext.remove(&key);
                if ext.is_empty() {
                    self.extensions.remove(&ext_key);
                    self.schemas.retain(|s| !s.eq_ignore_ascii_case(urn));
                }
                removed
            }
        }
    }

    /// Borrow an extension's attributes by URN, ignoring case.
    pub fn extension(&self, urn: &str) -> Option<&Map<String, Value>> {
        self.extension_key(urn).and_then(|key| self.extensions.get(&key))
    }

    fn extension_key(&self, urn: &str) -> Option<String> {
        self.extensions
            .keys()
            .find(|key| key.eq_ignore_ascii_case(urn))
            .cloned()
    }
}

enum Common {
    Id,
    ExternalId,
    Meta,
}

fn common_attribute(name: &str) -> Option<Common> {
    if name.eq_ignore_ascii_case("id") {
        Some(Common::Id)
    } else if name.eq_ignore_ascii_case("externalId") {
        Some(Common::ExternalId)
    } else if name.eq_ignore_ascii_case("meta") {
        Some(Common::Meta)
    } else {
        None
    }
}

/// Find the stored key matching `name` case-insensitively.
pub(crate) fn find_key<'m>(map: &'m Map<String, Value>, name: &str) -> Option<&'m str> {
    map.keys()
        .find(|key| key.as_str() == name)
        .or_else(|| map.keys().find(|key| key.eq_ignore_ascii_case(name)))
        .map(String::as_str)
}

fn parse_schemas(value: Value) -> ValidationResult<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(ValidationError::invalid_type("schemas", "array", type_name(&value)));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(ValidationError::invalid_type("schemas", "string", type_name(&other))),
        })
        .collect()
}

fn expect_string(attribute: &str, value: Value) -> ValidationResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ValidationError::invalid_type(attribute, "string", type_name(&other))),
    }
}

/// Get the type name of a JSON value for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "decimal",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
