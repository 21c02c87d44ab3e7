//! Error types for SCIM engine operations.
//!
//! Every error produced by the filter, projection and patch engines is a
//! caller-input error: it describes something wrong with a request, never a
//! process-fatal condition. [`ScimError`] aggregates them together with the
//! repository-level failures and knows how to describe itself in the SCIM
//! error vocabulary (`scimType` and HTTP status).

use serde::{Deserialize, Serialize};

/// Main error type for SCIM operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Validation errors when resource data doesn't conform to schema
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed filter text or a filter that cannot be evaluated
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Attribute reference that cannot be parsed or resolved
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    /// A PATCH operation failed; no changes were applied
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Schema or resource type not found errors
    #[error("Schema not found: {schema_id}")]
    SchemaNotFound { schema_id: String },

    /// Expected version did not match the stored resource
    #[error("Version mismatch for {resource_type} {id}: expected {expected}, found {current}")]
    VersionMismatch {
        resource_type: String,
        id: String,
        expected: String,
        current: String,
    },

    /// Conditional read found the caller's version is still current
    #[error("Resource not modified")]
    NotModified,

    /// Attribute with uniqueness constraint already taken
    #[error("Attribute '{attribute}' with value '{value}' already exists")]
    Uniqueness { attribute: String, value: String },

    /// Invalid request format or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Validation errors for schema compliance checking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Attribute value doesn't match expected type
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidAttributeType {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Multi-valued attribute provided as single value
    #[error("Attribute '{attribute}' must be multi-valued (array)")]
    ExpectedMultiValue { attribute: String },

    /// Single-valued attribute provided as array
    #[error("Attribute '{attribute}' must be single-valued (not array)")]
    ExpectedSingleValue { attribute: String },

    /// Unknown attribute in resource
    #[error("Unknown attribute '{attribute}' in schema '{schema_id}'")]
    UnknownAttribute {
        attribute: String,
        schema_id: String,
    },

    /// Unknown sub-attribute in complex attribute
    #[error("Complex attribute '{attribute}' contains unknown sub-attribute '{sub_attribute}'")]
    UnknownSubAttribute {
        attribute: String,
        sub_attribute: String,
    },

    /// Resource lists a schema URI the registry doesn't know
    #[error("Unknown schema URI: {uri}")]
    UnknownSchemaUri { uri: String },

    /// Schema definition breaks a structural rule
    #[error("Invalid schema '{schema_id}': {message}")]
    InvalidSchema { schema_id: String, message: String },

    /// Invalid meta structure
    #[error("Invalid 'meta' structure: {message}")]
    InvalidMetaStructure { message: String },

    /// Invalid datetime format
    #[error("Attribute '{attribute}' has invalid datetime format: {value}")]
    InvalidDateTimeFormat { attribute: String, value: String },

    /// Invalid binary data
    #[error("Attribute '{attribute}' has invalid binary data: {details}")]
    InvalidBinaryData { attribute: String, details: String },

    /// Replacement would change an immutable attribute that already holds a value
    #[error("Attribute '{attribute}' is immutable and cannot be changed")]
    ImmutableAttribute { attribute: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

/// Errors raised while parsing or evaluating a filter expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// The filter text does not follow the grammar
    #[error("Invalid filter at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// The filter is well formed but cannot be applied to the resource
    #[error("Cannot evaluate filter: {message}")]
    Evaluation { message: String },
}

/// Errors raised while parsing or resolving attribute references.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    /// The reference names nothing in the schema or its extensions
    #[error("Unknown attribute '{attribute}' for resource type '{resource_type}'")]
    UnknownAttribute {
        attribute: String,
        resource_type: String,
    },

    /// The reference token is lexically invalid
    #[error("Invalid attribute reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },
}

/// Failure of a PATCH request, carrying the index of the failing operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("operation {index} failed: {reason}")]
pub struct PatchError {
    /// Zero-based position of the failing operation in the request
    pub index: usize,
    /// Why the operation failed
    pub reason: PatchFailure,
}

/// The reason a single PATCH operation was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchFailure {
    /// Target attribute is read-only or immutable and already holds a value
    #[error("attribute '{attribute}' is {mutability} and cannot be modified")]
    AttemptToModifyImmutable {
        attribute: String,
        mutability: String,
    },

    /// The path (or its embedded filter) selects nothing
    #[error("no target matches path '{path}'")]
    NoSuchTarget { path: String },

    /// Unknown `op` value
    #[error("unsupported operation '{op}'")]
    UnsupportedOperation { op: String },

    /// `remove` without a path
    #[error("'{op}' operation requires a path")]
    MissingPath { op: String },

    /// `add`/`replace` without a value
    #[error("'{op}' operation requires a value")]
    MissingValue { op: String },

    /// The path cannot be parsed or used for this operation
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// The value does not fit the target attribute
    #[error("invalid value: {0}")]
    InvalidValue(#[from] ValidationError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Errors that can occur while building a schema registry or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Schema loading failed
    #[error("Failed to load schema: {schema_id}")]
    SchemaLoadError { schema_id: String },

    /// Schema JSON could not be read
    #[error("Failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    /// Schema JSON could not be parsed
    #[error("Failed to parse schema: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema definition breaks a structural rule
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// SCIM error message schema URI.
pub const ERROR_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// SCIM error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub schemas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<String>,
    pub detail: String,
    pub status: String,
}

impl ScimError {
    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a schema not found error
    pub fn schema_not_found(schema_id: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            schema_id: schema_id.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status code a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::ResourceNotFound { .. } | Self::SchemaNotFound { .. } => 404,
            Self::VersionMismatch { .. } => 412,
            Self::NotModified => 304,
            Self::Uniqueness { .. } => 409,
            Self::Storage(_) | Self::Internal { .. } => 500,
            _ => 400,
        }
    }

    /// SCIM `scimType` detail keyword (RFC 7644 section 3.12), if one applies.
    pub fn scim_type(&self) -> Option<&'static str> {
        match self {
            Self::Filter(_) => Some("invalidFilter"),
            Self::Attribute(_) => Some("invalidValue"),
            Self::Validation(ValidationError::ImmutableAttribute { .. }) => Some("mutability"),
            Self::Validation(_) => Some("invalidValue"),
            Self::Json(_) => Some("invalidSyntax"),
            Self::Uniqueness { .. } => Some("uniqueness"),
            Self::InvalidRequest { .. } => Some("invalidSyntax"),
            Self::Patch(error) => Some(match &error.reason {
                PatchFailure::AttemptToModifyImmutable { .. } => "mutability",
                PatchFailure::NoSuchTarget { .. } => "noTarget",
                PatchFailure::MissingPath { .. } => "noTarget",
                PatchFailure::InvalidPath { .. } | PatchFailure::Attribute(_) => "invalidPath",
                PatchFailure::Filter(_) => "invalidFilter",
                PatchFailure::InvalidValue(_) | PatchFailure::MissingValue { .. } => {
                    "invalidValue"
                }
                PatchFailure::UnsupportedOperation { .. } => "invalidSyntax",
            }),
            _ => None,
        }
    }

    /// Render this error as a SCIM error response body.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            schemas: vec![ERROR_SCHEMA.to_string()],
            scim_type: self.scim_type().map(str::to_string),
            detail: self.to_string(),
            status: self.status().to_string(),
        }
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

impl FilterError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}

impl PatchError {
    pub fn new(index: usize, reason: impl Into<PatchFailure>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type FilterResult<T> = Result<T, FilterError>;
pub type PatchResult<T> = Result<T, PatchError>;
pub type BuildResult<T> = Result<T, BuildError>;
