//! Database and collection commands.

use super::print_json;
use yudb_core::{SchemaSource, Shell};

/// List databases, or the collections of `database`.
pub fn ls(shell: &Shell, database: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&shell.ls(database)?)
}

/// Create a database or a collection.
///
/// An inline `--schema` takes precedence over `--schema-name`; with neither,
/// creating a collection is refused by the shell.
pub fn create(
    shell: &mut Shell,
    database: Option<&str>,
    collection: Option<&str>,
    schema: Option<&str>,
    schema_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = match (schema, schema_name) {
        (Some(text), _) => Some(SchemaSource::Inline(serde_json::from_str(text)?)),
        (None, Some(name)) => Some(SchemaSource::Named(name)),
        (None, None) => None,
    };
    print_json(&shell.create(database, collection, schema)?)
}

/// Remove a database or a collection.
pub fn remove(
    shell: &mut Shell,
    database: Option<&str>,
    collection: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&shell.remove(database, collection)?)
}
