//! Parameter accessor.
//!
//! Wraps a tool call's `arguments` object and exposes typed getters that
//! return the type's zero-value on missing/wrong-type access, leaving the
//! decision of whether absence is an error to the handler. This keeps
//! handler bodies free of ad hoc `serde_json::Value::get` chains.

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ParamAccessor {
    arguments: Value,
}

impl ParamAccessor {
    pub fn new(arguments: Option<Value>) -> Self {
        Self {
            arguments: arguments.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.arguments.get(name).is_some()
    }

    pub fn count(&self) -> usize {
        self.arguments.as_object().map(|o| o.len()).unwrap_or(0)
    }

    /// The raw subtree for a parameter, or `Value::Null` if absent.
    pub fn raw(&self, name: &str) -> Value {
        self.arguments.get(name).cloned().unwrap_or(Value::Null)
    }

    /// The whole arguments object, for handlers that want to inspect it
    /// directly (e.g. an `Object`-category parameter).
    pub fn raw_arguments(&self) -> &Value {
        &self.arguments
    }

    pub fn int(&self, name: &str) -> i64 {
        self.arguments.get(name).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn number(&self, name: &str) -> f64 {
        self.arguments.get(name).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn string(&self, name: &str) -> String {
        self.arguments
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.arguments.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn int_array(&self, name: &str) -> Vec<i64> {
        self.arguments
            .get(name)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    pub fn number_array(&self, name: &str) -> Vec<f64> {
        self.arguments
            .get(name)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    pub fn string_array(&self, name: &str) -> Vec<String> {
        self.arguments
            .get(name)
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn bool_array(&self, name: &str) -> Vec<bool> {
        self.arguments
            .get(name)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_bool).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_params_return_zero_values() {
        let acc = ParamAccessor::new(Some(json!({})));
        assert_eq!(acc.int("a"), 0);
        assert_eq!(acc.string("s"), "");
        assert!(!acc.bool("b"));
        assert!(!acc.has("a"));
    }

    #[test]
    fn wrong_type_returns_zero_value_not_error() {
        let acc = ParamAccessor::new(Some(json!({"a": "not a number"})));
        assert_eq!(acc.int("a"), 0);
    }

    #[test]
    fn reads_declared_types() {
        let acc = ParamAccessor::new(Some(json!({
            "a": 3, "b": 4.5, "s": "hi", "flag": true, "arr": [1,2,3]
        })));
        assert_eq!(acc.int("a"), 3);
        assert_eq!(acc.number("b"), 4.5);
        assert_eq!(acc.string("s"), "hi");
        assert!(acc.bool("flag"));
        assert_eq!(acc.int_array("arr"), vec![1, 2, 3]);
        assert_eq!(acc.count(), 5);
    }

    #[test]
    fn none_arguments_yields_empty_object() {
        let acc = ParamAccessor::new(None);
        assert_eq!(acc.count(), 0);
    }
}
