//! Schema registry for loading and accessing SCIM schemas and resource types.
//!
//! The registry is built once (from the embedded schemas, from files, or through
//! [`SchemaRegistryBuilder`]) and is read-only afterwards. Share it by reference
//! or behind an `Arc`; every engine call takes a [`ResourceSchema`] view borrowed
//! from it.

use super::embedded;
use super::types::{ResourceType, Schema};
use super::validation::validate_schema_definition;
use crate::error::{BuildError, BuildResult, ScimError, ScimResult};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Registry of SCIM schemas and the resource types built on them.
///
/// Schema URNs and resource type names are looked up case-insensitively.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
    resource_types: HashMap<String, ResourceType>,
}

impl SchemaRegistry {
    /// Create a new schema registry with the embedded core schemas and resource types.
    pub fn new() -> BuildResult<Self> {
        Self::with_embedded_schemas()
    }

    /// Create a registry with the embedded User, Group and Enterprise User schemas
    /// and the User/Group resource types.
    pub fn with_embedded_schemas() -> BuildResult<Self> {
        SchemaRegistryBuilder::new().with_embedded_schemas()?.build()
    }

    /// Start building a custom registry.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Create a schema registry by loading every `*.json` schema in a directory.
    ///
    /// A `ResourceTypes.json` file in the same directory, if present, supplies the
    /// resource types; otherwise the embedded User/Group resource types are used.
    pub fn from_schema_dir<P: AsRef<Path>>(schema_dir: P) -> BuildResult<Self> {
        let mut builder = SchemaRegistryBuilder::new();
        let mut resource_types = None;

        let mut paths: Vec<_> = fs::read_dir(schema_dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)?;
            if path.file_stem().and_then(|s| s.to_str()) == Some("ResourceTypes") {
                resource_types = Some(content);
            } else {
                builder = builder.add_schema_str(&content)?;
            }
        }

        let resource_types =
            resource_types.unwrap_or_else(|| embedded::core_resource_types().to_string());
        builder.add_resource_types_str(&resource_types)?.build()
    }

    /// Get all available schemas.
    pub fn get_schemas(&self) -> Vec<&Schema> {
        self.schemas.values().collect()
    }

    /// Get a specific schema by URN.
    pub fn get_schema(&self, id: &str) -> Option<&Schema> {
        self.schemas.get(&id.to_ascii_lowercase())
    }

    /// Get the core User schema, if registered.
    pub fn get_user_schema(&self) -> Option<&Schema> {
        self.get_schema(embedded::USER_SCHEMA)
    }

    /// Get the core Group schema, if registered.
    pub fn get_group_schema(&self) -> Option<&Schema> {
        self.get_schema(embedded::GROUP_SCHEMA)
    }

    /// Get all resource types.
    pub fn resource_types(&self) -> Vec<&ResourceType> {
        self.resource_types.values().collect()
    }

    /// Get a resource type by name.
    pub fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.resource_types.get(&name.to_ascii_lowercase())
    }

    /// Borrow the complete schema view (core schema + extensions) of a resource type.
    pub fn resource_schema(&self, resource_type: &str) -> ScimResult<ResourceSchema<'_>> {
        let rt = self
            .resource_type(resource_type)
            .ok_or_else(|| ScimError::schema_not_found(resource_type))?;
        let core = self
            .get_schema(&rt.schema)
            .ok_or_else(|| ScimError::schema_not_found(&rt.schema))?;
        let extensions = rt
            .schema_extensions
            .iter()
            .map(|ext| {
                self.get_schema(&ext.schema)
                    .ok_or_else(|| ScimError::schema_not_found(&ext.schema))
            })
            .collect::<ScimResult<Vec<_>>>()?;

        Ok(ResourceSchema {
            resource_type: rt,
            core,
            extensions,
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new().expect("Failed to load default schemas")
    }
}

/// Builder for [`SchemaRegistry`]; the only way to add schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    schemas: Vec<Schema>,
    resource_types: Vec<ResourceType>,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the embedded User, Group and Enterprise User schemas and resource types.
    pub fn with_embedded_schemas(self) -> BuildResult<Self> {
        self.add_schema_str(embedded::core_user_schema())?
            .add_schema_str(embedded::core_group_schema())?
            .add_schema_str(embedded::enterprise_user_schema())?
            .add_resource_types_str(embedded::core_resource_types())
    }

    /// Add a schema definition.
    pub fn add_schema(mut self, schema: Schema) -> BuildResult<Self> {
        validate_schema_definition(&schema)?;
        self.schemas.push(schema);
        Ok(self)
    }

    /// Add a schema from its JSON representation.
    pub fn add_schema_str(self, content: &str) -> BuildResult<Self> {
        let schema: Schema = serde_json::from_str(content)?;
        self.add_schema(schema)
    }

    /// Add a schema from a JSON file.
    pub fn add_schema_file<P: AsRef<Path>>(self, path: P) -> BuildResult<Self> {
        let content = fs::read_to_string(path)?;
        self.add_schema_str(&content)
    }

    /// Add a resource type.
    pub fn add_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_types.push(resource_type);
        self
    }

    /// Add resource types from a JSON array.
    pub fn add_resource_types_str(mut self, content: &str) -> BuildResult<Self> {
        let types: Vec<ResourceType> = serde_json::from_str(content)?;
        self.resource_types.extend(types);
        Ok(self)
    }

    /// Finish the registry, checking that every resource type refers to known schemas.
    pub fn build(self) -> BuildResult<SchemaRegistry> {
        let mut schemas = HashMap::new();
        for schema in self.schemas {
            let key = schema.id.to_ascii_lowercase();
            if schemas.contains_key(&key) {
                return Err(BuildError::InvalidConfiguration {
                    message: format!("duplicate schema '{}'", schema.id),
                });
            }
            schemas.insert(key, schema);
        }

        let mut resource_types = HashMap::new();
        for rt in self.resource_types {
            let referenced = std::iter::once(&rt.schema)
                .chain(rt.schema_extensions.iter().map(|ext| &ext.schema));
            for urn in referenced {
                if !schemas.contains_key(&urn.to_ascii_lowercase()) {
                    return Err(BuildError::SchemaLoadError {
                        schema_id: urn.clone(),
                    });
                }
            }
            resource_types.insert(rt.name.to_ascii_lowercase(), rt);
        }

        log::debug!(
            "Schema registry built with {} schemas and {} resource types",
            schemas.len(),
            resource_types.len()
        );

        Ok(SchemaRegistry {
            schemas,
            resource_types,
        })
    }
}

/// The schemas that describe one resource type: its core schema plus extensions.
///
/// This is the "schema" every engine operation is evaluated against.
#[derive(Debug, Clone)]
pub struct ResourceSchema<'a> {
    resource_type: &'a ResourceType,
    core: &'a Schema,
    extensions: Vec<&'a Schema>,
}

impl<'a> ResourceSchema<'a> {
    /// Build a view directly from schemas, without a registry.
    pub fn new(
        resource_type: &'a ResourceType,
        core: &'a Schema,
        extensions: Vec<&'a Schema>,
    ) -> Self {
        Self {
            resource_type,
            core,
            extensions,
        }
    }

    pub fn resource_type(&self) -> &'a ResourceType {
        self.resource_type
    }

    /// The default schema of the resource type.
    pub fn core(&self) -> &'a Schema {
        self.core
    }

    pub fn extensions(&self) -> &[&'a Schema] {
        &self.extensions
    }

    /// Look up the core schema or an extension by URN, ignoring case.
    pub fn schema(&self, urn: &str) -> Option<&'a Schema> {
        std::iter::once(self.core)
            .chain(self.extensions.iter().copied())
            .find(|schema| schema.id.eq_ignore_ascii_case(urn))
    }

    /// Find an extension schema by URN, ignoring case.
    pub fn extension(&self, urn: &str) -> Option<&'a Schema> {
        self.extensions
            .iter()
            .copied()
            .find(|schema| schema.id.eq_ignore_ascii_case(urn))
    }

    /// Whether the extension is required on resources of this type.
    pub fn is_required_extension(&self, urn: &str) -> bool {
        self.resource_type
            .schema_extensions
            .iter()
            .any(|ext| ext.required && ext.schema.eq_ignore_ascii_case(urn))
    }
}
