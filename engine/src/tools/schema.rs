//! Declarative input schemas for capabilities
//!
//! A small JSON-schema subset: an object with typed properties, optional
//! string enums, and a required list. Validation runs before any handler is
//! invoked, so handlers can rely on the declared shape.

use std::fmt;

use sdk::Arguments;
use serde_json::{json, Map, Value};

/// JSON type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            // Handlers read integers as i64
            ParamType::Integer => value.is_i64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub allowed: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Why a set of arguments was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("missing required argument '{0}'")]
    MissingRequired(String),

    #[error("argument '{name}' must be {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        found: &'static str,
    },

    #[error("argument '{name}' must be one of [{}], got {value}", allowed.join(", "))]
    NotAllowed {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// Input schema of a capability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    properties: Vec<Property>,
}

impl InputSchema {
    /// Empty object schema
    pub fn object() -> Self {
        Self::default()
    }

    /// Declare a required property
    pub fn required(self, name: &str, param_type: ParamType) -> Self {
        self.property(name, param_type, true, None)
    }

    /// Declare an optional property
    pub fn optional(self, name: &str, param_type: ParamType) -> Self {
        self.property(name, param_type, false, None)
    }

    /// Declare a string property restricted to fixed values
    pub fn string_enum(self, name: &str, values: &[&str], required: bool) -> Self {
        let allowed = values.iter().map(|v| v.to_string()).collect();
        self.property(name, ParamType::String, required, Some(allowed))
    }

    /// Attach a description to the most recently declared property
    pub fn describe(mut self, description: &str) -> Self {
        if let Some(last) = self.properties.last_mut() {
            last.description = Some(description.to_string());
        }
        self
    }

    fn property(
        mut self,
        name: &str,
        param_type: ParamType,
        required: bool,
        allowed: Option<Vec<String>>,
    ) -> Self {
        self.properties.retain(|p| p.name != name);
        self.properties.push(Property {
            name: name.to_string(),
            param_type,
            required,
            allowed,
            description: None,
        });
        self
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Check arguments against the schema.
    ///
    /// `null` for an optional property counts as absent.
    pub fn validate(&self, arguments: &Arguments) -> Result<(), SchemaViolation> {
        for key in arguments.keys() {
            if !self.properties.iter().any(|p| &p.name == key) {
                return Err(SchemaViolation::Unexpected(key.clone()));
            }
        }

        for prop in &self.properties {
            let value = match arguments.get(&prop.name) {
                None | Some(Value::Null) if prop.required => {
                    return Err(SchemaViolation::MissingRequired(prop.name.clone()))
                }
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            if !prop.param_type.accepts(value) {
                return Err(SchemaViolation::TypeMismatch {
                    name: prop.name.clone(),
                    expected: prop.param_type,
                    found: json_type_name(value),
                });
            }

            if let (Some(allowed), Some(text)) = (&prop.allowed, value.as_str()) {
                if !allowed.iter().any(|a| a == text) {
                    return Err(SchemaViolation::NotAllowed {
                        name: prop.name.clone(),
                        value: text.to_string(),
                        allowed: allowed.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Render as a JSON-schema object for the backend catalog
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for prop in &self.properties {
            let mut entry = json!({ "type": prop.param_type.as_str() });
            if let Some(allowed) = &prop.allowed {
                entry["enum"] = json!(allowed);
            }
            if let Some(description) = &prop.description {
                entry["description"] = json!(description);
            }
            properties.insert(prop.name.clone(), entry);
        }

        let required: Vec<&str> = self
            .properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(n) if !n.is_i64() => "integer out of range",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn puzzle_schema() -> InputSchema {
        InputSchema::object()
            .required("day", ParamType::Integer)
            .optional("year", ParamType::Integer)
            .string_enum("part", &["a", "b"], false)
    }

    #[test]
    fn test_valid_arguments() {
        let schema = puzzle_schema();
        assert!(schema.validate(&args(json!({"day": 5}))).is_ok());
        assert!(schema
            .validate(&args(json!({"day": 5, "year": 2020, "part": "b"})))
            .is_ok());
        assert!(schema.validate(&args(json!({"day": 5, "year": null}))).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = puzzle_schema().validate(&args(json!({"year": 2020}))).unwrap_err();
        assert_eq!(err, SchemaViolation::MissingRequired("day".to_string()));
    }

    #[test]
    fn test_type_mismatch() {
        let err = puzzle_schema().validate(&args(json!({"day": "five"}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "argument 'day' must be integer, got string"
        );

        let err = puzzle_schema().validate(&args(json!({"day": 5.5}))).unwrap_err();
        assert!(matches!(err, SchemaViolation::TypeMismatch { found: "number", .. }));
    }

    #[test]
    fn test_integer_beyond_i64_rejected() {
        let schema = puzzle_schema();
        let err = schema
            .validate(&args(json!({"day": u64::MAX})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "argument 'day' must be integer, got integer out of range"
        );

        let err = schema
            .validate(&args(json!({"day": 1, "year": u64::MAX})))
            .unwrap_err();
        assert!(matches!(err, SchemaViolation::TypeMismatch { ref name, .. } if name == "year"));

        assert!(schema.validate(&args(json!({"day": i64::MAX}))).is_ok());
        assert!(schema.validate(&args(json!({"day": i64::MIN}))).is_ok());
    }

    #[test]
    fn test_enum_and_unexpected() {
        let err = puzzle_schema()
            .validate(&args(json!({"day": 1, "part": "c"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "argument 'part' must be one of [a, b], got c");

        let err = puzzle_schema()
            .validate(&args(json!({"day": 1, "verbose": true})))
            .unwrap_err();
        assert_eq!(err, SchemaViolation::Unexpected("verbose".to_string()));
    }

    #[test]
    fn test_to_json() {
        let schema = puzzle_schema().describe("a or b");
        let value = schema.to_json();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["day"]["type"], "integer");
        assert_eq!(value["properties"]["part"]["enum"], json!(["a", "b"]));
        assert_eq!(value["properties"]["part"]["description"], "a or b");
        assert_eq!(value["required"], json!(["day"]));
    }
}
