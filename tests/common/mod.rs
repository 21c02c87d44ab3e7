//! Common test utilities for the SCIM engine integration tests.
//!
//! Provides registries (the embedded one and a custom Contractor registry with
//! an immutable `name.givenName`), ready-made providers and handlers, and
//! assertion macros shared by the integration modules.

use scim_engine::providers::{RequestContext, StandardResourceProvider};
use scim_engine::schema::{ResourceType, SchemaRegistry};
use scim_engine::storage::InMemoryStorage;
use scim_engine::{Resource, ScimOperationHandler};
use serde_json::Value;
use std::sync::Arc;

pub mod fixtures;

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE_SCHEMA: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const CONTRACTOR_SCHEMA: &str = "urn:example:params:scim:schemas:2.0:Contractor";

pub type TestProvider = StandardResourceProvider<InMemoryStorage>;
pub type TestHandler = ScimOperationHandler<TestProvider>;

/// Registry with the embedded User, Group and Enterprise User schemas
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new().expect("embedded schemas load")
}

/// Embedded schemas plus a `Contractor` resource type whose `name.givenName`
/// and `badgeNumber` are immutable and whose emails have no `type`
pub fn contractor_registry() -> SchemaRegistry {
    SchemaRegistry::builder()
        .with_embedded_schemas()
        .and_then(|builder| builder.add_schema_str(&fixtures::load_schema("Contractor")))
        .map(|builder| {
            builder.add_resource_type(ResourceType {
                name: "Contractor".to_string(),
                endpoint: "/Contractors".to_string(),
                description: "External contractor".to_string(),
                schema: CONTRACTOR_SCHEMA.to_string(),
                schema_extensions: Vec::new(),
            })
        })
        .and_then(|builder| builder.build())
        .expect("contractor registry builds")
}

/// Parse a fixture into a resource of the given type
pub fn resource(resource_type: &str, data: Value) -> Resource {
    Resource::from_json(resource_type, data).expect("fixture parses")
}

pub fn provider() -> TestProvider {
    StandardResourceProvider::new(InMemoryStorage::new(), Arc::new(registry()))
}

pub fn contractor_provider() -> TestProvider {
    StandardResourceProvider::new(InMemoryStorage::new(), Arc::new(contractor_registry()))
}

pub fn handler() -> TestHandler {
    let registry = Arc::new(registry());
    let provider = StandardResourceProvider::new(InMemoryStorage::new(), registry.clone());
    ScimOperationHandler::new(provider, registry)
}

pub fn context() -> RequestContext {
    RequestContext::with_generated_id()
}

/// Custom assertion macro for specific error messages
#[macro_export]
macro_rules! assert_error_message_contains {
    ($result:expr, $substring:expr) => {
        match $result {
            Err(err) => assert!(
                err.to_string().contains($substring),
                "Error message '{}' does not contain '{}'",
                err.to_string(),
                $substring
            ),
            Ok(_) => panic!(
                "Expected error containing '{}', but operation succeeded",
                $substring
            ),
        }
    };
}

/// Custom assertion macro for the `scimType` an error maps to
#[macro_export]
macro_rules! assert_scim_type {
    ($result:expr, $scim_type:expr) => {
        match $result {
            Err(err) => {
                let err: scim_engine::ScimError = err.into();
                assert_eq!(
                    err.scim_type(),
                    Some($scim_type),
                    "unexpected scimType for error: {}",
                    err
                )
            }
            Ok(_) => panic!(
                "Expected error with scimType '{}', but operation succeeded",
                $scim_type
            ),
        }
    };
}
