//! Dependency injection into handler bodies.
//!
//! A body receives one [`Invocation`]: the union of its parsed options and
//! arguments plus the reserved context bindings it declared through
//! [`ContextParam`]s. Undeclared context stays `None`.

use std::{collections::HashSet, sync::Arc};

use crate::{
    dispatch::{
        ContextParam, InvocationScope,
        grammar::{Bindings, ParsedGrammar, Value},
    },
    store::Session,
    transport::{IncomingMessage, Transport},
};

/// Everything a handler body receives for one invocation.
#[derive(Default)]
pub struct Invocation {
    values: Bindings,
    transport: Option<Arc<dyn Transport>>,
    message: Option<Arc<IncomingMessage>>,
    session: Option<Arc<dyn Session>>,
    raw: Option<String>,
    remainder: Option<Vec<String>>,
}

impl Invocation {
    /// Value bound to an option or argument field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Text value of a field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Integer value of a field.
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Boolean value of a field, `false` when unbound.
    pub fn flag(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub fn message(&self) -> Option<&Arc<IncomingMessage>> {
        self.message.as_ref()
    }

    pub fn session(&self) -> Option<&Arc<dyn Session>> {
        self.session.as_ref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn remainder(&self) -> Option<&[String]> {
        self.remainder.as_deref()
    }
}

/// Sources of the reserved context bindings.
pub struct ContextSources<'a> {
    pub transport: &'a Arc<dyn Transport>,
    pub message: &'a Arc<IncomingMessage>,
    pub scope: &'a InvocationScope,
    /// Text following the command head
    pub raw: &'a str,
}

/// Builds the invocation of a handler declaring `context`.
///
/// Argument bindings override option bindings sharing a field name.
pub fn inject(
    context: &HashSet<ContextParam>,
    parsed: ParsedGrammar,
    sources: ContextSources<'_>,
) -> Invocation {
    let ParsedGrammar {
        options,
        arguments,
        remainder,
    } = parsed;

    let mut values = options;
    values.extend(arguments);

    let wants = |param: ContextParam| context.contains(&param);

    Invocation {
        values,
        transport: wants(ContextParam::Transport).then(|| Arc::clone(sources.transport)),
        message: wants(ContextParam::Message).then(|| Arc::clone(sources.message)),
        session: wants(ContextParam::Scope).then(|| sources.scope.session()),
        raw: wants(ContextParam::Raw).then(|| sources.raw.to_string()),
        remainder: wants(ContextParam::Remainder).then_some(remainder),
    }
}
