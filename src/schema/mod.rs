//! Schema definitions and validation for SCIM resources.
//!
//! This module provides the schema registry and the validation rules of
//! RFC 7643: attribute types, multiplicity, required attributes and
//! sub-attribute structure.
//!
//! # Key Types
//!
//! - [`Schema`] - SCIM schema definition with attributes and metadata
//! - [`SchemaRegistry`] - Registry for managing and accessing schemas
//! - [`ResourceSchema`] - A resource type's core schema plus its extensions
//! - [`AttributeDefinition`] - Individual attribute specifications and constraints
//!
//! # Examples
//!
//! ```rust
//! use scim_engine::schema::SchemaRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let users = registry.resource_schema("User")?;
//! assert!(users.core().attribute("userName").is_some());
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod registry;
pub mod types;
pub mod validation;


// Re-export the main types for convenience
pub use registry::{ResourceSchema, SchemaRegistry, SchemaRegistryBuilder};
pub use types::{
    AttributeDefinition, AttributeType, Mutability, ResourceType, Returned, Schema,
    SchemaExtension, Uniqueness,
};
pub use validation::{OperationContext, validate_resource, validate_schema_definition};
