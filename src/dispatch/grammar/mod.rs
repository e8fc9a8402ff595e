//! Per-handler option and argument grammar.
//!
//! A [`Grammar`] is the ordered rule set a handler declares. Parsing runs in two
//! passes over the chunks produced by the tokenizer:
//!
//! 1. **Options** - leading chunks naming a declared option are consumed together
//!    with their values. The first chunk that is not a declared option name (or a
//!    literal `--`) ends this pass.
//! 2. **Arguments** - the residual chunks are bound to positional rules in
//!    declaration order, according to each rule's [`Arity`].
//!
//! Chunks left over after both passes are the unconsumed remainder, which
//! handlers can request through
//! [`ContextParam::Remainder`](crate::dispatch::ContextParam::Remainder).
//!
//! Parsing is all-or-nothing: the first failing rule aborts it with a
//! [`GrammarError`] carrying that rule's message and no bindings escape.
//!
//! # Examples
//!
//! ```
//! # use strea::dispatch::grammar::{ArgumentRule, Arity, Grammar, OptionRule, Value, ValueKind};
//! let grammar = Grammar::default()
//!     .option(OptionRule::new("count", &["-n"]).kind(ValueKind::Integer))
//!     .argument(ArgumentRule::new("title").arity(Arity::RemainderConcatenated));
//!
//! let chunks: Vec<String> = ["-n", "11", "hot", "spring"].iter().map(|c| c.to_string()).collect();
//! let parsed = grammar.parse(&chunks).unwrap();
//! assert_eq!(parsed.options["count"], Value::Integer(11));
//! assert_eq!(parsed.arguments["title"], Value::Text("hot spring".to_string()));
//! ```

mod rule;
mod value;

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

pub use crate::dispatch::grammar::{
    rule::{ArgumentRule, Arity, OptionRule},
    value::{Bindings, Value, ValueKind},
};

/// Marks the end of options, everything after it is positional.
const END_OF_OPTIONS: &str = "--";

/// An option or argument rule rejected the input.
///
/// The message is the rule's configured error, meant to be shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GrammarError {
    message: String,
}

impl GrammarError {
    pub fn new(message: impl Into<String>) -> Self {
        GrammarError {
            message: message.into(),
        }
    }
}

/// Outcome of a successful parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedGrammar {
    pub options: Bindings,
    pub arguments: Bindings,
    /// Chunks no argument rule consumed
    pub remainder: Vec<String>,
}

/// Ordered option and argument rules of one handler.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    options: Vec<OptionRule>,
    arguments: Vec<ArgumentRule>,
}

impl Grammar {
    /// Appends an option rule.
    pub fn option(mut self, rule: OptionRule) -> Self {
        self.options.push(rule);
        self
    }

    /// Appends a positional argument rule.
    pub fn argument(mut self, rule: ArgumentRule) -> Self {
        self.arguments.push(rule);
        self
    }

    pub fn options(&self) -> &[OptionRule] {
        &self.options
    }

    pub fn arguments(&self) -> &[ArgumentRule] {
        &self.arguments
    }

    /// Parses options then arguments.
    ///
    /// # Errors
    ///
    /// Returns the [`GrammarError`] of the first rule whose arity or coercion fails.
    pub fn parse(&self, chunks: &[String]) -> Result<ParsedGrammar, GrammarError> {
        let (options, argument_chunks) = self.parse_options(chunks)?;
        let (arguments, remainder) = self.parse_arguments(argument_chunks)?;

        Ok(ParsedGrammar {
            options,
            arguments,
            remainder,
        })
    }

    /// Consumes leading option chunks.
    ///
    /// Returns the option bindings and the residual chunks.
    pub fn parse_options<'a>(
        &self,
        chunks: &'a [String],
    ) -> Result<(Bindings, &'a [String]), GrammarError> {
        let mut collected: HashMap<&str, Vec<Value>> = HashMap::new();
        let mut cursor = 0;

        while let Some(chunk) = chunks.get(cursor) {
            if chunk == END_OF_OPTIONS {
                cursor += 1;
                break;
            }

            let (name, inline_value) = match chunk.split_once('=') {
                Some((name, value)) if name.starts_with('-') => (name, Some(value)),
                _ => (chunk.as_str(), None),
            };
            let Some(rule) = self.options.iter().find(|rule| rule.matches(name)) else {
                break;
            };
            cursor += 1;

            let value = if rule.is_flag {
                match inline_value {
                    Some(value) => rule.coerce(value)?,
                    None => Value::Bool(true),
                }
            } else {
                let raw = match inline_value {
                    Some(value) => value,
                    None => {
                        let value = chunks.get(cursor).ok_or_else(|| rule.missing())?;
                        cursor += 1;
                        value.as_str()
                    }
                };
                rule.coerce(raw)?
            };

            collected.entry(rule.field.as_str()).or_default().push(value);
        }

        let mut options = Bindings::new();
        for rule in &self.options {
            let values = collected.remove(rule.field.as_str()).unwrap_or_default();

            if values.is_empty() {
                if let Some(default) = &rule.default {
                    options.insert(rule.field.clone(), default.clone());
                } else if rule.required {
                    return Err(rule.missing());
                } else if rule.arity == Arity::ZeroOrMore {
                    options.insert(rule.field.clone(), Value::List(Vec::new()));
                }
                continue;
            }

            let value = match rule.arity {
                _ if rule.is_flag => values.into_iter().last(),
                Arity::ExactlyOne => values.into_iter().last(),
                Arity::ZeroOrMore => Some(Value::List(values)),
                Arity::RemainderConcatenated => Some(Value::Text(join(&values))),
            };
            if let Some(value) = value {
                options.insert(rule.field.clone(), value);
            }
        }

        debug!("parsed options {:?}", options);

        Ok((options, &chunks[cursor..]))
    }

    /// Binds chunks to positional rules in declaration order.
    ///
    /// Returns the argument bindings and the chunks left unconsumed.
    pub fn parse_arguments(
        &self,
        chunks: &[String],
    ) -> Result<(Bindings, Vec<String>), GrammarError> {
        let mut arguments = Bindings::new();
        let mut cursor = 0;

        for rule in &self.arguments {
            let rest = &chunks[cursor..];

            match rule.arity {
                Arity::ExactlyOne => match rest.first() {
                    Some(chunk) => {
                        cursor += 1;
                        arguments.insert(rule.field.clone(), rule.coerce(chunk)?);
                    }
                    None => bind_missing(rule, &mut arguments)?,
                },
                Arity::ZeroOrMore => {
                    cursor = chunks.len();
                    if rest.is_empty() && rule.default.is_some() {
                        bind_missing(rule, &mut arguments)?;
                        continue;
                    }
                    let values = rest
                        .iter()
                        .map(|chunk| rule.coerce(chunk))
                        .collect::<Result<Vec<_>, _>>()?;
                    arguments.insert(rule.field.clone(), Value::List(values));
                }
                Arity::RemainderConcatenated => {
                    cursor = chunks.len();
                    let joined = rest.join(" ");
                    if joined.is_empty() {
                        bind_missing(rule, &mut arguments)?;
                    } else {
                        arguments.insert(rule.field.clone(), rule.coerce(&joined)?);
                    }
                }
            }
        }

        debug!("parsed arguments {:?}", arguments);

        Ok((arguments, chunks[cursor..].to_vec()))
    }
}

/// Applies the default of an argument with nothing left to consume.
fn bind_missing(rule: &ArgumentRule, arguments: &mut Bindings) -> Result<(), GrammarError> {
    if let Some(default) = &rule.default {
        arguments.insert(rule.field.clone(), default.clone());
        Ok(())
    } else if rule.required {
        Err(rule.missing())
    } else {
        Ok(())
    }
}

fn join(values: &[Value]) -> String {
    let texts: Vec<String> = values.iter().map(Value::to_string).collect();
    texts.join(" ")
}
