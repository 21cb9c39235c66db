//! Performance oriented JSON manipulation.

pub use serde_json::Map;
pub use serde_json::Value;

/// A JSON object.
pub type Object = Map<String, Value>;

/// Extension trait for [`serde_json::Value`].
pub(crate) trait ValueExt {
    /// Removes `key` from the value if it is an object, returning what was stored there.
    fn take_key(&mut self, key: &str) -> Option<Value>;

    /// A short name for the JSON type of the value, used in error messages.
    fn kind(&self) -> &'static str;
}

impl ValueExt for Value {
    fn take_key(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Object(object) => object.shift_remove(key),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}
