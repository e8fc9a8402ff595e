//! Handler registry.
//!
//! The registry maps an [`EventCategory`] to its handlers, in registration order,
//! and to an alias table mapping each alias to its canonical handler name. It is
//! assembled once at startup through a [`RegistryBuilder`] and is immutable
//! afterwards, so dispatches share it without locking.

use std::collections::{HashMap, HashSet};

use log::debug;
use thiserror::Error;

use crate::dispatch::{
    HandlerDescriptor,
    grammar::{ArgumentRule, OptionRule},
};

/// Kind of inbound event handlers are registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// A chat message
    Message,
}

/// Errors raised while assembling the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another handler of the category already uses this name
    #[error("handler `{name}` is already registered for {category:?} events")]
    DuplicateName {
        category: EventCategory,
        name: String,
    },
    /// The alias is already a handler name or alias in the category
    #[error("alias `{alias}` of handler `{name}` collides with an existing handler or alias")]
    AliasCollision { alias: String, name: String },
    /// The configuration names a handler module that does not exist
    #[error("unknown handler module `{0}`")]
    UnknownModule(String),
}

/// Handlers and aliases of one category.
#[derive(Default)]
struct CategoryTable {
    handlers: Vec<HandlerDescriptor>,
    /// Handler names
    names: HashSet<String>,
    /// (alias, position of the canonical handler) in registration order
    aliases: Vec<(String, usize)>,
    alias_index: HashMap<String, String>,
}

impl CategoryTable {
    fn is_taken(&self, name: &str) -> bool {
        self.names.contains(name) || self.alias_index.contains_key(name)
    }
}

/// Mutable registry used during startup.
///
/// # Examples
///
/// ```
/// # use strea::dispatch::{EventCategory, Flow, HandlerDescriptor, RegistryBuilder};
/// let mut builder = RegistryBuilder::new();
/// builder
///     .register(
///         EventCategory::Message,
///         HandlerDescriptor::command("ping", |_| async { Ok(Flow::Stop) }).alias("p"),
///     )
///     .unwrap();
/// let registry = builder.build();
/// let (alias, handler) = registry.aliases(EventCategory::Message).next().unwrap();
/// assert_eq!((alias, handler.name()), ("p", "ping"));
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    tables: HashMap<EventCategory, CategoryTable>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Registers a handler after every handler registered so far.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateName`] if the name is already a handler name
    /// - [`RegistryError::AliasCollision`] if the name or one of the aliases is
    ///   already used in the category, or an alias repeats the handler's own name
    pub fn register(
        &mut self,
        category: EventCategory,
        descriptor: HandlerDescriptor,
    ) -> Result<(), RegistryError> {
        let table = self.tables.entry(category).or_default();
        let name = descriptor.name().to_string();

        if table.names.contains(&name) {
            return Err(RegistryError::DuplicateName { category, name });
        }
        if let Some(canonical) = table.alias_index.get(&name) {
            return Err(RegistryError::AliasCollision {
                alias: name,
                name: canonical.clone(),
            });
        }

        for (position, alias) in descriptor.aliases().iter().enumerate() {
            let repeated = descriptor.aliases()[..position].contains(alias);
            if repeated || *alias == name || table.is_taken(alias) {
                return Err(RegistryError::AliasCollision {
                    alias: alias.clone(),
                    name,
                });
            }
        }

        let grammar = descriptor.grammar();
        debug!(
            "registering {:?} handler `{}` with aliases {:?}, options {:?} and arguments {:?}",
            category,
            name,
            descriptor.aliases(),
            grammar.options().iter().map(OptionRule::field).collect::<Vec<_>>(),
            grammar.arguments().iter().map(ArgumentRule::field).collect::<Vec<_>>()
        );

        let position = table.handlers.len();
        for alias in descriptor.aliases() {
            table.aliases.push((alias.clone(), position));
            table.alias_index.insert(alias.clone(), name.clone());
        }
        table.names.insert(name);
        table.handlers.push(descriptor);

        Ok(())
    }

    /// Freezes the registry.
    pub fn build(self) -> Registry {
        Registry {
            tables: self.tables,
        }
    }
}

/// Immutable handler registry shared by every dispatch.
pub struct Registry {
    tables: HashMap<EventCategory, CategoryTable>,
}

impl Registry {
    /// Handlers of `category` in registration order.
    pub fn handlers(&self, category: EventCategory) -> impl Iterator<Item = &HandlerDescriptor> {
        self.tables
            .get(&category)
            .into_iter()
            .flat_map(|table| table.handlers.iter())
    }

    /// `(alias, canonical handler)` pairs of `category` in registration order.
    pub fn aliases(
        &self,
        category: EventCategory,
    ) -> impl Iterator<Item = (&str, &HandlerDescriptor)> {
        self.tables.get(&category).into_iter().flat_map(|table| {
            table
                .aliases
                .iter()
                .map(move |(alias, position)| (alias.as_str(), &table.handlers[*position]))
        })
    }

    /// Number of handlers registered for `category`.
    pub fn len(&self, category: EventCategory) -> usize {
        self.tables
            .get(&category)
            .map_or(0, |table| table.handlers.len())
    }
}
