//! Values bound by the grammar and their coercions.

use std::collections::HashMap;

/// Parsed values keyed by field name.
pub type Bindings = HashMap<String, Value>;

/// A coerced option or argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Values of a `zero-or-more` field
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{}", text),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::List(values) => {
                let joined: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "{}", joined.join(" "))
            }
        }
    }
}

/// Coercion applied to every chunk bound to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Text,
    Integer,
    Float,
    /// Accepts `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`
    Bool,
}

impl ValueKind {
    /// Coerces a chunk, `None` when the chunk does not fit the kind.
    ///
    /// # Examples
    ///
    /// ```
    /// # use strea::dispatch::grammar::{Value, ValueKind};
    /// assert_eq!(ValueKind::Integer.coerce("42"), Some(Value::Integer(42)));
    /// assert_eq!(ValueKind::Integer.coerce("forty-two"), None);
    /// ```
    pub fn coerce(self, chunk: &str) -> Option<Value> {
        match self {
            ValueKind::Text => Some(Value::Text(chunk.to_string())),
            ValueKind::Integer => chunk.parse().ok().map(Value::Integer),
            ValueKind::Float => chunk.parse().ok().map(Value::Float),
            ValueKind::Bool => match chunk.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}
