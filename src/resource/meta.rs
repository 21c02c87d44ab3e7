//! The `meta` block carried by every SCIM resource.

use crate::error::{ValidationError, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource metadata (RFC 7643 section 3.1).
///
/// All fields are optional so that a projected response can carry only the
/// sub-attributes that survived attribute selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Meta {
    /// Meta for a freshly created resource; `created` and `lastModified` are equal.
    pub fn new_for_creation(resource_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            created: Some(now),
            last_modified: Some(now),
            location: None,
            version: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Convert to the JSON object form used on the wire.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Parse the JSON object form; unknown keys are rejected.
    pub fn from_value(value: &Value) -> ValidationResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::InvalidMetaStructure {
                message: "meta must be an object".to_string(),
            })?;
        const KNOWN: [&str; 5] = ["resourceType", "created", "lastModified", "location", "version"];
        if let Some(unknown) = obj
            .keys()
            .find(|key| !KNOWN.iter().any(|k| k.eq_ignore_ascii_case(key)))
        {
            return Err(ValidationError::UnknownSubAttribute {
                attribute: "meta".to_string(),
                sub_attribute: unknown.clone(),
            });
        }
        serde_json::from_value(value.clone()).map_err(|e| ValidationError::InvalidMetaStructure {
            message: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
