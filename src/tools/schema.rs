//! Parameter descriptors and JSON-Schema Draft-07 synthesis.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Number,
    String,
    Boolean,
}

impl PrimitiveType {
    fn schema_name(self) -> &'static str {
        match self {
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

/// A single parameter: a primitive, an array of primitives, or an embedded
/// JSON-Schema object fragment.
#[derive(Debug, Clone)]
pub enum ParamDesc {
    Single {
        name: String,
        ty: PrimitiveType,
        description: String,
        required: bool,
    },
    Array {
        name: String,
        element_type: PrimitiveType,
        element_description: String,
        description: String,
        required: bool,
    },
    /// `schema` is an embedded JSON-Schema Draft-07 fragment; a parse
    /// failure at registration time substitutes `{"type": "object"}`
    /// rather than rejecting the whole tool.
    Object {
        name: String,
        schema: String,
        description: String,
        required: bool,
    },
}

impl ParamDesc {
    pub fn name(&self) -> &str {
        match self {
            ParamDesc::Single { name, .. }
            | ParamDesc::Array { name, .. }
            | ParamDesc::Object { name, .. } => name,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            ParamDesc::Single { required, .. }
            | ParamDesc::Array { required, .. }
            | ParamDesc::Object { required, .. } => *required,
        }
    }

    pub fn single(
        name: impl Into<String>,
        ty: PrimitiveType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        ParamDesc::Single {
            name: name.into(),
            ty,
            description: description.into(),
            required,
        }
    }

    pub fn array(
        name: impl Into<String>,
        element_type: PrimitiveType,
        element_description: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        ParamDesc::Array {
            name: name.into(),
            element_type,
            element_description: element_description.into(),
            description: description.into(),
            required,
        }
    }

    /// Convenience entry point for hosts that only have parallel
    /// `names[]`/`descriptions[]`/`types[]` arrays rather than `ParamDesc`
    /// values. `types` uses the same vocabulary as
    /// `PrimitiveType::schema_name` (`"integer"`, `"number"`, `"string"`,
    /// `"boolean"`); unrecognized entries default to `"string"`.
    pub fn from_parallel_arrays(names: &[&str], descriptions: &[&str], types: &[&str]) -> Vec<ParamDesc> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let ty = match types.get(i).copied().unwrap_or("string") {
                    "integer" => PrimitiveType::Integer,
                    "number" => PrimitiveType::Number,
                    "boolean" => PrimitiveType::Boolean,
                    _ => PrimitiveType::String,
                };
                let description = descriptions.get(i).copied().unwrap_or("").to_string();
                ParamDesc::single(*name, ty, description, true)
            })
            .collect()
    }
}

/// Synthesizes the Draft-07 `inputSchema` for a tool from its parameters.
pub fn synthesize_schema(title: &str, description: &str, params: &[ParamDesc]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let prop = match param {
            ParamDesc::Single { ty, description, .. } => serde_json::json!({
                "type": ty.schema_name(),
                "description": description,
            }),
            ParamDesc::Array {
                element_type,
                element_description,
                description,
                ..
            } => serde_json::json!({
                "type": "array",
                "description": description,
                "items": {
                    "type": element_type.schema_name(),
                    "description": element_description,
                }
            }),
            ParamDesc::Object { schema, description, .. } => {
                let mut parsed: Value = serde_json::from_str(schema)
                    .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));
                if let Some(obj) = parsed.as_object_mut() {
                    obj.entry("description")
                        .or_insert_with(|| Value::String(description.clone()));
                }
                parsed
            }
        };
        properties.insert(param.name().to_string(), prop);
        if param.required() {
            required.push(Value::String(param.name().to_string()));
        }
    }

    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "title": title,
        "description": description,
        "properties": Value::Object(properties),
        "required": Value::Array(required),
        "additionalProperties": false,
    })
}

/// Structural check used when a tool has no custom validator: presence of
/// every required property, and a primitive-type match for properties that
/// are present. Does not enforce schema-deep constraints (min/max, pattern).
pub fn check_structural(schema: &Value, arguments: &Value) -> Result<(), String> {
    let properties = schema.get("properties").and_then(Value::as_object);
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();

    let args_obj = arguments.as_object();

    for name in &required {
        match args_obj.and_then(|o| o.get(*name)) {
            Some(_) => {}
            None => return Err(format!("missing required parameter: {name}")),
        }
    }

    if let Some(properties) = properties {
        if let Some(args_obj) = args_obj {
            for (name, value) in args_obj {
                if let Some(prop_schema) = properties.get(name) {
                    if let Some(expected) = prop_schema.get("type").and_then(Value::as_str) {
                        if !matches_primitive(expected, value) {
                            return Err(format!(
                                "parameter {name} expected type {expected}, got {value}"
                            ));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn matches_primitive(expected: &str, value: &Value) -> bool {
    match expected {
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesizes_single_and_array_params() {
        let params = vec![
            ParamDesc::single("a", PrimitiveType::Number, "first operand", true),
            ParamDesc::array("tags", PrimitiveType::String, "a tag", "tag list", false),
        ];
        let schema = synthesize_schema("add", "adds numbers", &params);
        assert_eq!(schema["properties"]["a"]["type"], "number");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["a"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn object_param_falls_back_on_bad_embedded_schema() {
        let params = vec![ParamDesc::Object {
            name: "cfg".to_string(),
            schema: "not json".to_string(),
            description: "config".to_string(),
            required: false,
        }];
        let schema = synthesize_schema("t", "d", &params);
        assert_eq!(schema["properties"]["cfg"]["type"], "object");
    }

    #[test]
    fn structural_check_flags_missing_required() {
        let params = vec![ParamDesc::single("a", PrimitiveType::Number, "", true)];
        let schema = synthesize_schema("t", "d", &params);
        let err = check_structural(&schema, &serde_json::json!({})).unwrap_err();
        assert!(err.contains("a"));
    }

    #[test]
    fn structural_check_flags_wrong_type() {
        let params = vec![ParamDesc::single("a", PrimitiveType::Number, "", true)];
        let schema = synthesize_schema("t", "d", &params);
        let err = check_structural(&schema, &serde_json::json!({"a": "nope"})).unwrap_err();
        assert!(err.contains("type"));
    }
}
