//! Tagged-variant result type for a tool handler's return value.
//!
//! A handler constructs a `ToolValue` and returns it by value; there is
//! nothing to free and no runtime type tag to get wrong.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    Int(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl ToolValue {
    /// The `text` rendering used inside a success content block.
    pub fn stringify(&self) -> String {
        match self {
            ToolValue::Int(i) => i.to_string(),
            ToolValue::Number(n) => n.to_string(),
            ToolValue::Text(s) => s.clone(),
            ToolValue::Bool(b) => b.to_string(),
            ToolValue::Null => "null".to_string(),
        }
    }

    /// The `structuredContent` rendering — a real JSON value, not a string.
    pub fn to_json(&self) -> Value {
        match self {
            ToolValue::Int(i) => Value::from(*i),
            ToolValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ToolValue::Text(s) => Value::String(s.clone()),
            ToolValue::Bool(b) => Value::Bool(*b),
            ToolValue::Null => Value::Null,
        }
    }
}

impl From<i64> for ToolValue {
    fn from(v: i64) -> Self {
        ToolValue::Int(v)
    }
}

impl From<f64> for ToolValue {
    fn from(v: f64) -> Self {
        ToolValue::Number(v)
    }
}

impl From<String> for ToolValue {
    fn from(v: String) -> Self {
        ToolValue::Text(v)
    }
}

impl From<bool> for ToolValue {
    fn from(v: bool) -> Self {
        ToolValue::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringifies_each_variant() {
        assert_eq!(ToolValue::Int(7).stringify(), "7");
        assert_eq!(ToolValue::Bool(true).stringify(), "true");
        assert_eq!(ToolValue::Null.stringify(), "null");
    }
}
