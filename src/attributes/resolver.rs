//! Resolution of attribute references against a resource type's schemas.

use super::reference::AttributeReference;
use crate::error::AttributeError;
use crate::schema::{AttributeDefinition, ResourceSchema, Schema};

use std::collections::BTreeSet;

/// An attribute reference bound to its schema definitions.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAttribute<'a> {
    /// Schema declaring the attribute (core or extension)
    pub schema: &'a Schema,
    /// Whether `schema` is an extension of the resource type
    pub is_extension: bool,
    pub attribute: &'a AttributeDefinition,
    pub sub_attribute: Option<&'a AttributeDefinition>,
}

impl<'a> ResolvedAttribute<'a> {
    /// The definition the reference finally points at.
    pub fn target(&self) -> &'a AttributeDefinition {
        self.sub_attribute.unwrap_or(self.attribute)
    }

    /// Extension URN to pass to [`Resource`](crate::Resource) accessors.
    pub fn extension(&self) -> Option<&'a str> {
        self.is_extension.then_some(self.schema.id.as_str())
    }

    /// Canonical form: full schema URN and schema-declared name casing.
    pub fn reference(&self) -> AttributeReference {
        AttributeReference::new(
            Some(self.schema.id.as_str()),
            self.attribute.name.clone(),
            self.sub_attribute.map(|sub| sub.name.as_str()),
        )
    }
}

/// Bind one reference to its schema definitions.
///
/// A reference without a URN is looked up in the core schema only.
pub fn resolve_reference<'a>(
    reference: &AttributeReference,
    schema: &ResourceSchema<'a>,
) -> Result<ResolvedAttribute<'a>, AttributeError> {
    let unknown = || AttributeError::UnknownAttribute {
        attribute: reference.to_string(),
        resource_type: schema.resource_type().name.clone(),
    };

    let owner = match &reference.schema_urn {
        None => schema.core(),
        Some(urn) => schema.schema(urn).ok_or_else(unknown)?,
    };
    let attribute = owner
        .attribute(&reference.attribute_name)
        .ok_or_else(unknown)?;
    let sub_attribute = match &reference.sub_attribute_name {
        None => None,
        Some(sub) => Some(attribute.sub_attribute(sub).ok_or_else(unknown)?),
    };

    Ok(ResolvedAttribute {
        schema: owner,
        is_extension: !owner.id.eq_ignore_ascii_case(&schema.core().id),
        attribute,
        sub_attribute,
    })
}

/// Resolve include/exclude tokens into canonical attribute references.
///
/// Unknown attributes are a client error rather than being ignored.
///
/// ```rust
/// use scim_engine::attributes::resolve;
/// use scim_engine::schema::SchemaRegistry;
///
/// let registry = SchemaRegistry::default();
/// let users = registry.resource_schema("User").unwrap();
/// let refs = resolve(["NAME.givenName"], &users).unwrap();
/// assert_eq!(
///     refs.iter().next().unwrap().to_string(),
///     "urn:ietf:params:scim:schemas:core:2.0:User:name.givenName"
/// );
/// assert!(resolve(["emails.type"], &users).is_ok());
/// assert!(resolve(["shoeSize"], &users).is_err());
/// ```
pub fn resolve<I, S>(
    tokens: I,
    schema: &ResourceSchema<'_>,
) -> Result<BTreeSet<AttributeReference>, AttributeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| {
            let reference: AttributeReference = token.as_ref().parse()?;
            resolve_reference(&reference, schema).map(|resolved| resolved.reference())
        })
        .collect()
}
