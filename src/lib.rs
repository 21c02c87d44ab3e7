//! SCIM 2.0 resource engines for Rust.
//!
//! Provides the schema-driven core of a SCIM service: a filter engine, an
//! attribute projection engine and a PATCH engine, together with a pluggable
//! async repository layer.
//!
//! # Core Components
//!
//! - [`filter`] - parse and evaluate filter expressions against resources
//! - [`attributes`] - resolve attribute references and project responses
//! - [`patch`] - apply ordered PATCH operations atomically
//! - [`SchemaRegistry`] - schemas, resource types and extensions
//! - [`ResourceProvider`] - repository trait, with [`providers::StandardResourceProvider`]
//! - [`ScimOperationHandler`] - request-level orchestration
//!
//! # Quick Start
//!
//! ```rust
//! use scim_engine::{Resource, SchemaRegistry};
//! use scim_engine::filter::{matches, parse};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::new().unwrap();
//! let users = registry.resource_schema("User").unwrap();
//! let user = Resource::from_json("User", json!({
//!     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!     "userName": "BJensen"
//! })).unwrap();
//!
//! let filter = parse(r#"userName eq "bjensen""#).unwrap();
//! assert!(matches(&filter, &user, &users).unwrap());
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod filter;
pub mod operation_handler;
pub mod patch;
pub mod providers;
pub mod resource;
pub mod schema;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::EngineConfig;
pub use error::{ScimError, ScimResult};
pub use providers::{RequestContext, ResourceProvider};
pub use resource::{Resource, VersionedResource};
pub use schema::{ResourceSchema, Schema, SchemaRegistry};

pub use operation_handler::{ScimOperationHandler, ScimOperationRequest, ScimOperationResponse};
