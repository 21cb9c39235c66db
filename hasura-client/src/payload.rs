//! GraphQL literal values and their text form.
//!
//! Everything inlined into a document (filter trees, orderings, insert and
//! update objects) is first converted to an [`InputValue`] and then rendered
//! here, so escaping lives in exactly one place.

use displaydoc::Display;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::json_ext::ValueExt;
use crate::schema::is_valid_name;

/// Payload serialization errors. They are raised before anything is sent.
#[derive(Debug, Error, Display, Clone, PartialEq)]
#[non_exhaustive]
pub enum PayloadError {
    /// value cannot be represented as a GraphQL literal: {0}
    Unserializable(String),
    /// '{0}' is not a valid GraphQL name
    InvalidName(String),
    /// non-finite number {0} cannot be represented as a GraphQL literal
    NonFiniteFloat(f64),
    /// integer {0} is out of range
    IntegerOutOfRange(String),
    /// expected {expected}, found {found}
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// A GraphQL input value literal.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// An enum value such as an order direction. Only rendered bare by
    /// [`serialize_enum_payload`].
    Enum(String),
    /// A reference to a declared variable, rendered as `$name`.
    Variable(String),
    List(Vec<InputValue>),
    /// Object fields in the order they are rendered.
    Object(Vec<(String, InputValue)>),
}

impl InputValue {
    /// Converts any serializable value, typically an insert or update payload.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, PayloadError> {
        let value = serde_json::to_value(value)
            .map_err(|error| PayloadError::Unserializable(error.to_string()))?;
        Self::from_json(value)
    }

    /// Converts a JSON value. Object keys must be valid GraphQL names.
    pub fn from_json(value: Value) -> Result<Self, PayloadError> {
        Ok(match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    InputValue::Int(i)
                } else if n.is_u64() {
                    return Err(PayloadError::IntegerOutOfRange(n.to_string()));
                } else {
                    InputValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => InputValue::String(s),
            Value::Array(items) => InputValue::List(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(object) => InputValue::Object(
                object
                    .into_iter()
                    .map(|(key, value)| {
                        if !is_valid_name(&key) {
                            return Err(PayloadError::InvalidName(key));
                        }
                        Ok((key, Self::from_json(value)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Like [`from_serialize`](Self::from_serialize), but only accepts an
    /// object or a list of objects.
    pub fn objects_from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, PayloadError> {
        let value = serde_json::to_value(value)
            .map_err(|error| PayloadError::Unserializable(error.to_string()))?;
        let valid = match &value {
            Value::Object(_) => true,
            Value::Array(items) => items.iter().all(Value::is_object),
            _ => false,
        };
        if !valid {
            return Err(PayloadError::UnexpectedShape {
                expected: "an object or a list of objects",
                found: value.kind(),
            });
        }
        Self::from_json(value)
    }

    /// Like [`from_serialize`](Self::from_serialize), but only accepts an object.
    pub fn object_from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, PayloadError> {
        let value = serde_json::to_value(value)
            .map_err(|error| PayloadError::Unserializable(error.to_string()))?;
        if !value.is_object() {
            return Err(PayloadError::UnexpectedShape {
                expected: "an object",
                found: value.kind(),
            });
        }
        Self::from_json(value)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Plain,
    Enum,
}

/// Renders `value` as a GraphQL literal. Enum values are rendered as strings.
pub fn serialize(value: &InputValue) -> Result<String, PayloadError> {
    let mut out = String::new();
    write_value(&mut out, value, Mode::Plain)?;
    Ok(out)
}

/// Renders `value` as a GraphQL literal with enum values left unquoted, e.g.
/// `{ created_at: desc }`.
pub fn serialize_enum_payload(value: &InputValue) -> Result<String, PayloadError> {
    let mut out = String::new();
    write_value(&mut out, value, Mode::Enum)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &InputValue, mode: Mode) -> Result<(), PayloadError> {
    match value {
        InputValue::Null => out.push_str("null"),
        InputValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        InputValue::Int(i) => out.push_str(&i.to_string()),
        InputValue::Float(f) => {
            let number =
                serde_json::Number::from_f64(*f).ok_or(PayloadError::NonFiniteFloat(*f))?;
            out.push_str(&number.to_string());
        }
        InputValue::String(s) => write_string(out, s),
        InputValue::Enum(name) if mode == Mode::Enum => {
            if !is_valid_name(name) || matches!(name.as_str(), "true" | "false" | "null") {
                return Err(PayloadError::InvalidName(name.clone()));
            }
            out.push_str(name);
        }
        InputValue::Enum(name) => write_string(out, name),
        InputValue::Variable(name) => {
            if !is_valid_name(name) {
                return Err(PayloadError::InvalidName(name.clone()));
            }
            out.push('$');
            out.push_str(name);
        }
        InputValue::List(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, mode)?;
            }
            out.push(']');
        }
        InputValue::Object(fields) if fields.is_empty() => out.push_str("{}"),
        InputValue::Object(fields) => {
            out.push_str("{ ");
            for (index, (key, field)) in fields.iter().enumerate() {
                if !is_valid_name(key) {
                    return Err(PayloadError::InvalidName(key.clone()));
                }
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_value(out, field, mode)?;
            }
            out.push_str(" }");
        }
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
