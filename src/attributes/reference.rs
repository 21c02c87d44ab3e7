//! Attribute references: `userName`, `name.familyName`,
//! `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber`.

use crate::error::AttributeError;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A parsed attribute path: optional schema URN, attribute name, optional sub-attribute.
///
/// Equality, hashing and ordering ignore ASCII case in all three parts. A missing
/// `schema_urn` means "the core schema of the resource type"; the resolver fills it
/// in, so resolved references compare equal regardless of how they were written.
#[derive(Debug, Clone)]
pub struct AttributeReference {
    pub schema_urn: Option<String>,
    pub attribute_name: String,
    pub sub_attribute_name: Option<String>,
}

impl AttributeReference {
    pub fn new(
        schema_urn: Option<&str>,
        attribute_name: impl Into<String>,
        sub_attribute_name: Option<&str>,
    ) -> Self {
        Self {
            schema_urn: schema_urn.map(str::to_string),
            attribute_name: attribute_name.into(),
            sub_attribute_name: sub_attribute_name.map(str::to_string),
        }
    }

    /// The same reference without its sub-attribute.
    pub fn parent(&self) -> Self {
        Self {
            schema_urn: self.schema_urn.clone(),
            attribute_name: self.attribute_name.clone(),
            sub_attribute_name: None,
        }
    }

    /// The same reference pointing at `sub` under this attribute.
    pub fn with_sub_attribute(&self, sub: &str) -> Self {
        Self {
            schema_urn: self.schema_urn.clone(),
            attribute_name: self.attribute_name.clone(),
            sub_attribute_name: Some(sub.to_string()),
        }
    }

    /// Whether `self` names the same top-level attribute as `other`.
    pub fn same_attribute(&self, other: &Self) -> bool {
        self.parent() == other.parent()
    }

    fn key(&self) -> (Option<String>, String, Option<String>) {
        (
            self.schema_urn.as_deref().map(str::to_ascii_lowercase),
            self.attribute_name.to_ascii_lowercase(),
            self.sub_attribute_name.as_deref().map(str::to_ascii_lowercase),
        )
    }
}

impl PartialEq for AttributeReference {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AttributeReference {}

impl Hash for AttributeReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for AttributeReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for AttributeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(urn) = &self.schema_urn {
            write!(f, "{}:", urn)?;
        }
        f.write_str(&self.attribute_name)?;
        if let Some(sub) = &self.sub_attribute_name {
            write!(f, ".{}", sub)?;
        }
        Ok(())
    }
}

impl FromStr for AttributeReference {
    type Err = AttributeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| AttributeError::InvalidReference {
            reference: text.to_string(),
            message: message.to_string(),
        };

        let text_trimmed = text.trim();
        if text_trimmed.is_empty() {
            return Err(invalid("attribute reference is empty"));
        }

        // The URN is everything up to the last ':'; "2.0" style version
        // segments inside the URN never follow the last colon.
        let (schema_urn, path) = if text_trimmed.len() > 4
            && text_trimmed
                .get(..4)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
        {
            let split = text_trimmed
                .rfind(':')
                .ok_or_else(|| invalid("missing attribute name after schema URN"))?;
            (Some(&text_trimmed[..split]), &text_trimmed[split + 1..])
        } else if text_trimmed.contains(':') {
            return Err(invalid("schema prefix must be a URN"));
        } else {
            (None, text_trimmed)
        };

        let mut parts = path.split('.');
        let attribute_name = parts.next().unwrap_or_default();
        let sub_attribute_name = parts.next();
        if parts.next().is_some() {
            return Err(invalid("attribute paths have at most one sub-attribute"));
        }

        if !is_attribute_name(attribute_name) {
            return Err(invalid("invalid attribute name"));
        }
        if let Some(sub) = sub_attribute_name {
            if !is_attribute_name(sub) {
                return Err(invalid("invalid sub-attribute name"));
            }
        }

        Ok(Self::new(schema_urn, attribute_name, sub_attribute_name))
    }
}

/// `ATTRNAME = ALPHA *(nameChar)`, plus the `$ref` special name.
pub fn is_attribute_name(name: &str) -> bool {
    if name == "$ref" {
        return true;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

/// Split a comma-separated `attributes`/`excludedAttributes` parameter.
pub fn parse_attribute_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
