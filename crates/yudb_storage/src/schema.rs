//! Collection schema checking.
//!
//! Engines validate every written document against the schema supplied at
//! collection creation. The supported keywords are a structural subset of
//! JSON Schema:
//!
//! - `type`: a type name or an array of type names
//! - `properties`: per-key sub-schemas for objects
//! - `required`: keys an object must carry
//! - `additionalProperties`: `false` forbids keys not named in `properties`
//! - `items`: sub-schema applied to every array element
//! - `enum`: the value must equal one of the listed values
//!
//! Unknown keywords are ignored, so `{}` accepts every document.

use crate::error::{StorageError, StorageResult};
use serde_json::{Map, Value};

const TYPE_NAMES: [&str; 7] = [
    "object", "array", "string", "number", "integer", "boolean", "null",
];

/// A parsed collection schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Value,
}

impl Schema {
    /// Parses and checks an encoded schema.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the text is not JSON or uses a supported
    /// keyword with the wrong shape.
    pub fn parse(text: &str) -> StorageResult<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| StorageError::InvalidSchema(e.to_string()))?;
        check_shape(&root, "$")?;
        Ok(Self { root })
    }

    /// Validates a document, returning a description of the first violation.
    pub fn validate(&self, document: &Value) -> Result<(), String> {
        validate_node(&self.root, document, "$")
    }
}

fn check_shape(schema: &Value, path: &str) -> StorageResult<()> {
    let Some(map) = schema.as_object() else {
        if schema.is_boolean() {
            return Ok(());
        }
        return Err(StorageError::InvalidSchema(format!(
            "{path}: schema must be an object or a boolean"
        )));
    };

    if let Some(ty) = map.get("type") {
        let names: Vec<&Value> = match ty {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for name in names {
            match name.as_str() {
                Some(n) if TYPE_NAMES.contains(&n) => {}
                _ => {
                    return Err(StorageError::InvalidSchema(format!(
                        "{path}: unknown type {name}"
                    )))
                }
            }
        }
    }

    if let Some(props) = map.get("properties") {
        let props = props.as_object().ok_or_else(|| {
            StorageError::InvalidSchema(format!("{path}: 'properties' must be an object"))
        })?;
        for (key, sub) in props {
            check_shape(sub, &format!("{path}.{key}"))?;
        }
    }

    if let Some(required) = map.get("required") {
        let all_strings = required
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !all_strings {
            return Err(StorageError::InvalidSchema(format!(
                "{path}: 'required' must be an array of strings"
            )));
        }
    }

    if let Some(extra) = map.get("additionalProperties") {
        if !extra.is_boolean() {
            check_shape(extra, &format!("{path}.*"))?;
        }
    }

    if let Some(items) = map.get("items") {
        check_shape(items, &format!("{path}[]"))?;
    }

    if let Some(options) = map.get("enum") {
        if !options.is_array() {
            return Err(StorageError::InvalidSchema(format!(
                "{path}: 'enum' must be an array"
            )));
        }
    }

    Ok(())
}

fn type_matches(name: &str, value: &Value) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn validate_node(schema: &Value, value: &Value, path: &str) -> Result<(), String> {
    let map = match schema {
        Value::Bool(true) => return Ok(()),
        Value::Bool(false) => return Err(format!("{path}: no value is allowed here")),
        Value::Object(map) => map,
        // Shape was checked at parse time.
        _ => return Ok(()),
    };

    if let Some(ty) = map.get("type") {
        let ok = match ty {
            Value::String(name) => type_matches(name, value),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| type_matches(name, value)),
            _ => true,
        };
        if !ok {
            return Err(format!("{path}: expected type {ty}, found {value}"));
        }
    }

    if let Some(Value::Array(options)) = map.get("enum") {
        if !options.contains(value) {
            return Err(format!("{path}: {value} is not one of the allowed values"));
        }
    }

    if let Value::Object(fields) = value {
        validate_object(map, fields, path)?;
    }

    if let (Some(items), Value::Array(elements)) = (map.get("items"), value) {
        for (i, element) in elements.iter().enumerate() {
            validate_node(items, element, &format!("{path}[{i}]"))?;
        }
    }

    Ok(())
}

fn validate_object(
    schema: &Map<String, Value>,
    fields: &Map<String, Value>,
    path: &str,
) -> Result<(), String> {
    if let Some(Value::Array(required)) = schema.get("required") {
        for key in required.iter().filter_map(Value::as_str) {
            if !fields.contains_key(key) {
                return Err(format!("{path}: missing required property '{key}'"));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    for (key, field) in fields {
        let child = format!("{path}.{key}");
        match properties.and_then(|props| props.get(key)) {
            Some(sub) => validate_node(sub, field, &child)?,
            None => match schema.get("additionalProperties") {
                // The engine-managed identity is always allowed.
                Some(Value::Bool(false)) if key != "$id" => {
                    return Err(format!("{path}: unexpected property '{key}'"));
                }
                Some(extra @ Value::Object(_)) if key != "$id" => {
                    validate_node(extra, field, &child)?;
                }
                _ => {}
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::parse(&value.to_string()).unwrap()
    }

    #[test]
    fn empty_schema_accepts_anything() {
        let s = schema(json!({}));
        assert!(s.validate(&json!({"a": 1})).is_ok());
        assert!(s.validate(&json!([1, 2])).is_ok());
    }

    #[test]
    fn required_properties_enforced() {
        let s = schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        }));

        assert!(s.validate(&json!({"name": "Ada"})).is_ok());
        let err = s.validate(&json!({"age": 3})).unwrap_err();
        assert!(err.contains("name"));
        assert!(s.validate(&json!({"name": 7})).is_err());
    }

    #[test]
    fn additional_properties_false_allows_id() {
        let s = schema(json!({
            "type": "object",
            "properties": { "n": { "type": "integer" } },
            "additionalProperties": false
        }));

        assert!(s.validate(&json!({"$id": "x", "n": 1})).is_ok());
        assert!(s.validate(&json!({"n": 1, "m": 2})).is_err());
    }

    #[test]
    fn integer_rejects_fractions() {
        let s = schema(json!({"type": "integer"}));
        assert!(s.validate(&json!(3)).is_ok());
        assert!(s.validate(&json!(3.5)).is_err());
    }

    #[test]
    fn type_union_and_enum() {
        let s = schema(json!({"type": ["string", "null"], "enum": ["a", null]}));
        assert!(s.validate(&json!("a")).is_ok());
        assert!(s.validate(&Value::Null).is_ok());
        assert!(s.validate(&json!("b")).is_err());
        assert!(s.validate(&json!(1)).is_err());
    }

    #[test]
    fn items_checked_per_element() {
        let s = schema(json!({"type": "array", "items": {"type": "number"}}));
        assert!(s.validate(&json!([1, 2.5])).is_ok());
        let err = s.validate(&json!([1, "x"])).unwrap_err();
        assert!(err.contains("[1]"));
    }

    #[test]
    fn malformed_schemas_rejected() {
        assert!(Schema::parse("not json").is_err());
        assert!(Schema::parse(r#"{"type": "float"}"#).is_err());
        assert!(Schema::parse(r#"{"required": "name"}"#).is_err());
        assert!(Schema::parse(r#"{"properties": []}"#).is_err());
        assert!(Schema::parse("42").is_err());
    }
}
