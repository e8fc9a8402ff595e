//! Declarative option and argument rules.

use crate::dispatch::grammar::{GrammarError, Value, ValueKind};

/// How many chunks a field consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    /// A single chunk
    #[default]
    ExactlyOne,
    /// Every remaining chunk, bound as a [`Value::List`]
    ZeroOrMore,
    /// Every remaining chunk, joined with single spaces into one value
    RemainderConcatenated,
}

/// Named option, given as `--name value`, `--name=value` or, for flags, `--name`.
///
/// Repeating an `exactly-one` option keeps the last value. `zero-or-more` options
/// collect every occurrence, `remainder-concatenated` options join them.
///
/// # Examples
///
/// ```
/// # use strea::dispatch::grammar::{OptionRule, ValueKind};
/// let count = OptionRule::new("count", &["--count", "-n"])
///     .kind(ValueKind::Integer)
///     .default(strea::dispatch::grammar::Value::Integer(1));
/// let upper = OptionRule::flag("upper", &["--upper"]);
/// ```
#[derive(Debug, Clone)]
pub struct OptionRule {
    pub(crate) field: String,
    pub(crate) names: Vec<String>,
    pub(crate) arity: Arity,
    pub(crate) is_flag: bool,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) kind: ValueKind,
    count_error: Option<String>,
    type_error: Option<String>,
}

impl OptionRule {
    /// Creates an optional text option bound to `field`.
    pub fn new(field: &str, names: &[&str]) -> Self {
        OptionRule {
            field: field.to_string(),
            names: names.iter().map(|name| name.to_string()).collect(),
            arity: Arity::ExactlyOne,
            is_flag: false,
            required: false,
            default: None,
            kind: ValueKind::Text,
            count_error: None,
            type_error: None,
        }
    }

    /// Creates a boolean flag, `false` unless given.
    pub fn flag(field: &str, names: &[&str]) -> Self {
        OptionRule {
            is_flag: true,
            kind: ValueKind::Bool,
            default: Some(Value::Bool(false)),
            ..OptionRule::new(field, names)
        }
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Fails parsing when the option is absent.
    #[cfg(test)]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the message used for both count and coercion failures.
    pub fn error(self, message: &str) -> Self {
        self.count_error(message).type_error(message)
    }

    /// Message used when the option or its value is missing.
    pub fn count_error(mut self, message: &str) -> Self {
        self.count_error = Some(message.to_string());
        self
    }

    /// Message used when the value can not be coerced.
    pub fn type_error(mut self, message: &str) -> Self {
        self.type_error = Some(message.to_string());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    pub(crate) fn missing(&self) -> GrammarError {
        GrammarError::new(
            self.count_error
                .clone()
                .unwrap_or_else(|| format!("`{}` option requires a value", self.names.join("/"))),
        )
    }

    pub(crate) fn coerce(&self, chunk: &str) -> Result<Value, GrammarError> {
        self.kind.coerce(chunk).ok_or_else(|| {
            GrammarError::new(self.type_error.clone().unwrap_or_else(|| {
                format!("`{}` is not a valid value for `{}`", chunk, self.names.join("/"))
            }))
        })
    }
}

/// Positional argument, matched in declaration order.
///
/// Arguments are required unless they carry a [`ArgumentRule::default`].
///
/// # Examples
///
/// ```
/// # use strea::dispatch::grammar::{ArgumentRule, Arity};
/// let title = ArgumentRule::new("title")
///     .arity(Arity::RemainderConcatenated)
///     .count_error("Please give a scout title");
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentRule {
    pub(crate) field: String,
    pub(crate) arity: Arity,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) kind: ValueKind,
    count_error: Option<String>,
    type_error: Option<String>,
}

impl ArgumentRule {
    /// Creates a required single-chunk text argument bound to `field`.
    pub fn new(field: &str) -> Self {
        ArgumentRule {
            field: field.to_string(),
            arity: Arity::ExactlyOne,
            required: true,
            default: None,
            kind: ValueKind::Text,
            count_error: None,
            type_error: None,
        }
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Leaves the field unbound instead of failing when no chunk is left.
    #[cfg(test)]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Binds `value` when no chunk is left.
    pub fn default(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    /// Sets the message used for both count and coercion failures.
    pub fn error(self, message: &str) -> Self {
        self.count_error(message).type_error(message)
    }

    /// Message used when the argument is missing.
    pub fn count_error(mut self, message: &str) -> Self {
        self.count_error = Some(message.to_string());
        self
    }

    /// Message used when a chunk can not be coerced.
    pub fn type_error(mut self, message: &str) -> Self {
        self.type_error = Some(message.to_string());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn missing(&self) -> GrammarError {
        GrammarError::new(
            self.count_error
                .clone()
                .unwrap_or_else(|| format!("missing argument `{}`", self.field)),
        )
    }

    pub(crate) fn coerce(&self, chunk: &str) -> Result<Value, GrammarError> {
        self.kind.coerce(chunk).ok_or_else(|| {
            GrammarError::new(self.type_error.clone().unwrap_or_else(|| {
                format!("`{}` is not a valid value for `{}`", chunk, self.field)
            }))
        })
    }
}
