//! Collection schema arguments and named-schema resolution.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Schema argument accepted when creating a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// A schema given as a structured value.
    Inline(Value),
    /// A schema given by name, resolved through a [`SchemaLoader`].
    Named(String),
}

impl From<Value> for SchemaSource {
    fn from(value: Value) -> Self {
        Self::Inline(value)
    }
}

impl From<&str> for SchemaSource {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for SchemaSource {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// Resolves named schemas to structured values.
pub trait SchemaLoader: Send + Sync {
    /// Returns the schema registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaNotFound` if nothing is registered under the name.
    fn load(&self, name: &str) -> CoreResult<Value>;
}

/// Loads schemas from JSON files in one directory.
///
/// # Resolution
///
/// - `name` is resolved relative to the base directory
/// - a name without an extension gets `.json` appended
/// - names that are absolute or contain `..` are rejected
///
/// So `users` resolves to `<dir>/users.json` and `v2/users.schema` to
/// `<dir>/v2/users.schema`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaLoader {
    dir: PathBuf,
}

impl DirectorySchemaLoader {
    /// Creates a loader rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the base directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file a name resolves to, without reading it.
    pub fn resolve(&self, name: &str) -> CoreResult<PathBuf> {
        let relative = Path::new(name);
        let escapes = name.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(CoreError::schema_not_found(name));
        }

        let mut path = self.dir.join(relative);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        Ok(path)
    }
}

impl SchemaLoader for DirectorySchemaLoader {
    fn load(&self, name: &str) -> CoreResult<Value> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(CoreError::schema_not_found(name));
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Resolves schemas from an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MapSchemaLoader {
    schemas: HashMap<String, Value>,
}

impl MapSchemaLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }
}

impl SchemaLoader for MapSchemaLoader {
    fn load(&self, name: &str) -> CoreResult<Value> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::schema_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn source_conversions() {
        assert_eq!(SchemaSource::from(json!({})), SchemaSource::Inline(json!({})));
        assert_eq!(SchemaSource::from("users"), SchemaSource::Named("users".into()));
    }

    #[test]
    fn directory_resolution_rules() {
        let loader = DirectorySchemaLoader::new("/schemas");
        assert_eq!(loader.resolve("users").unwrap(), Path::new("/schemas/users.json"));
        assert_eq!(
            loader.resolve("v2/users.schema").unwrap(),
            Path::new("/schemas/v2/users.schema")
        );
        assert!(loader.resolve("../etc/passwd").is_err());
        assert!(loader.resolve("/abs").is_err());
        assert!(loader.resolve("").is_err());
    }

    #[test]
    fn directory_loads_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("person.json"), r#"{"required":["name"]}"#).unwrap();

        let loader = DirectorySchemaLoader::new(dir.path());
        assert_eq!(loader.load("person").unwrap(), json!({"required": ["name"]}));
        assert!(matches!(
            loader.load("ghost"),
            Err(CoreError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn directory_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{").unwrap();
        let loader = DirectorySchemaLoader::new(dir.path());
        assert!(matches!(loader.load("bad"), Err(CoreError::Json(_))));
    }

    #[test]
    fn map_loader() {
        let loader = MapSchemaLoader::new().with("empty", json!({}));
        assert_eq!(loader.load("empty").unwrap(), json!({}));
        assert!(loader.load("other").is_err());
    }
}
