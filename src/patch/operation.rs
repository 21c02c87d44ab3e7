//! PATCH request messages and operation paths (RFC 7644 section 3.5.2).

use crate::attributes::AttributeReference;
use crate::config::FilterConfig;
use crate::error::{FilterResult, PatchFailure, ScimError, ScimResult};
use crate::filter::{Filter, parse_path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Schema URN of a PATCH request message.
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// PATCH operation kind. Parsed case-insensitively (`"Add"`, `"REPLACE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

impl FromStr for PatchOp {
    type Err = PatchFailure;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        match op.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "replace" => Ok(Self::Replace),
            _ => Err(PatchFailure::UnsupportedOperation { op: op.to_string() }),
        }
    }
}

impl TryFrom<String> for PatchOp {
    type Error = PatchFailure;

    fn try_from(op: String) -> Result<Self, Self::Error> {
        op.parse()
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        })
    }
}

/// A single PATCH operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: Option<&str>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.map(str::to_string),
            value: Some(value),
        }
    }

    pub fn remove(path: &str) -> Self {
        Self {
            op: PatchOp::Remove,
            path: Some(path.to_string()),
            value: None,
        }
    }

    pub fn replace(path: Option<&str>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.map(str::to_string),
            value: Some(value),
        }
    }
}

/// The PATCH request body: `{"schemas": [...], "Operations": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self {
            schemas: vec![PATCH_OP_SCHEMA.to_string()],
            operations,
        }
    }

    /// Parse and check a request body.
    pub fn from_json(body: Value) -> ScimResult<Self> {
        let request: Self = serde_json::from_value(body)?;
        request.validate()?;
        Ok(request)
    }

    /// The message must declare the PatchOp schema and carry at least one operation.
    pub fn validate(&self) -> ScimResult<()> {
        if !self
            .schemas
            .iter()
            .any(|schema| schema.eq_ignore_ascii_case(PATCH_OP_SCHEMA))
        {
            return Err(ScimError::invalid_request(format!(
                "PATCH request must declare schema {}",
                PATCH_OP_SCHEMA
            )));
        }
        if self.operations.is_empty() {
            return Err(ScimError::invalid_request(
                "PATCH request must contain at least one operation",
            ));
        }
        Ok(())
    }
}

/// A parsed operation path: attribute reference plus optional value filter.
///
/// `emails[type eq "work"].value` has attribute `emails.value` and filter
/// `type eq "work"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    pub attribute: AttributeReference,
    pub filter: Option<Filter>,
}

impl PathExpression {
    pub fn parse(path: &str, config: &FilterConfig) -> FilterResult<Self> {
        let (attribute, filter) = parse_path(path, config)?;
        Ok(Self { attribute, filter })
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.filter, &self.attribute.sub_attribute_name) {
            (Some(filter), Some(sub)) => {
                write!(f, "{}[{}].{}", self.attribute.parent(), filter, sub)
            }
            (Some(filter), None) => write!(f, "{}[{}]", self.attribute, filter),
            (None, _) => write!(f, "{}", self.attribute),
        }
    }
}
