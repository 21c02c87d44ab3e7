//! # SCIM Schema Validator
//!
//! A command-line utility for validating SCIM schema files before they are
//! loaded into a [`SchemaRegistry`].
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-validator schemas/User.json
//! cargo run --bin schema-validator ./schemas/
//! ```
//!
//! Set `RUST_LOG=debug` for registry loading details.
//!
//! ## Validation Rules
//!
//! - Must be valid JSON with `id`, `name` and `attributes`
//! - Schema ID must be a URI (starts with `urn:` or `http`)
//! - Attribute names are unique (case-insensitively) at every level
//! - Complex attributes must have sub-attributes; other types cannot
//! - Complex attributes cannot nest complex sub-attributes
//!
//! A directory is additionally test-loaded into a registry. If it holds a
//! `ResourceTypes.json`, the resource types must refer to schemas that load.
//!
//! ## Exit Codes
//!
//! - `0`: All schemas are valid
//! - `1`: One or more schemas are invalid or validation error occurred

use log::{debug, info};
use scim_engine::schema::{Schema, SchemaRegistry, validate_schema_definition};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <schema-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} schemas/User.json", args[0]);
        eprintln!("  {} ./schemas/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);
    if path.is_file() {
        validate_single_file(path);
    } else if path.is_dir() {
        validate_directory(path);
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        process::exit(1);
    }
}

fn validate_single_file(file_path: &Path) {
    println!("Validating schema file: {}", file_path.display());

    match load_and_validate_schema(file_path) {
        Ok(schema) => {
            println!("✓ Schema is valid!");
            print_schema_summary(&schema);
        }
        Err(e) => {
            eprintln!("❌ Schema validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn validate_directory(dir_path: &Path) {
    println!("Validating schemas in directory: {}", dir_path.display());

    let paths = match json_files(dir_path) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            process::exit(1);
        }
    };

    let mut valid = Vec::new();
    let mut error_count = 0;
    let mut has_resource_types = false;

    for path in &paths {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name == "ResourceTypes.json" {
            has_resource_types = true;
            continue;
        }

        println!("\nValidating: {}", file_name);
        match load_and_validate_schema(path) {
            Ok(schema) => {
                println!("  ✓ Valid - {} ({})", schema.name, schema.id);
                valid.push(schema);
            }
            Err(e) => {
                eprintln!("  ❌ Invalid - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid schemas: {}", valid.len());
    println!("  Invalid schemas: {}", error_count);

    if error_count > 0 {
        process::exit(1);
    }

    println!("\nTesting schema registry loading...");
    let loaded = if has_resource_types {
        SchemaRegistry::from_schema_dir(dir_path)
    } else {
        debug!("No ResourceTypes.json found, loading schemas only");
        valid
            .into_iter()
            .try_fold(SchemaRegistry::builder(), |builder, schema| builder.add_schema(schema))
            .and_then(|builder| builder.build())
    };

    match loaded {
        Ok(registry) => {
            println!("✓ Schema registry loaded successfully");
            let schemas = registry.get_schemas();
            println!("  Total schemas loaded: {}", schemas.len());
            for schema in schemas {
                println!("    - {} ({})", schema.name, schema.id);
            }
            for resource_type in registry.resource_types() {
                println!(
                    "    resource type {} at {} ({} extensions)",
                    resource_type.name,
                    resource_type.endpoint,
                    resource_type.schema_extensions.len()
                );
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to load schema registry: {}", e);
            process::exit(1);
        }
    }
}

fn json_files(dir_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir_path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_and_validate_schema(file_path: &Path) -> Result<Schema, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let json_value: serde_json::Value = serde_json::from_str(&content)?;

    let obj = json_value
        .as_object()
        .ok_or("Schema must be a JSON object")?;
    for field in ["id", "name", "attributes"] {
        if !obj.contains_key(field) {
            return Err(format!("Schema missing required '{}' field", field).into());
        }
    }

    let schema: Schema = serde_json::from_value(json_value)?;
    if schema.attributes.is_empty() {
        return Err("Schema must have at least one attribute".into());
    }
    validate_schema_definition(&schema)?;
    info!("Schema {} passed structural checks", schema.id);

    Ok(schema)
}

fn print_schema_summary(schema: &Schema) {
    println!();
    println!("Schema Summary:");
    println!("  ID: {}", schema.id);
    println!("  Name: {}", schema.name);
    println!("  Description: {}", schema.description);
    println!("  Attributes: {}", schema.attributes.len());

    let mut type_counts = BTreeMap::new();
    for attr in &schema.attributes {
        *type_counts.entry(attr.data_type.to_string()).or_insert(0) += 1;
    }
    let required: Vec<&str> = schema
        .attributes
        .iter()
        .filter(|attr| attr.required)
        .map(|attr| attr.name.as_str())
        .collect();
    let multi_valued = schema.attributes.iter().filter(|attr| attr.multi_valued).count();

    println!("  Required attributes: {}", required.len());
    println!("  Multi-valued attributes: {}", multi_valued);
    println!("  Attribute types:");
    for (attr_type, count) in type_counts {
        println!("    - {}: {}", attr_type, count);
    }
    if !required.is_empty() {
        println!("  Required attribute names: {}", required.join(", "));
    }
}
