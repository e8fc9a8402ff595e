//! Text-command dispatch.
//!
//! This module turns an inbound chat message into zero or more handler invocations.
//! Handlers are registered once at startup and the dispatcher evaluates them for
//! every message, in registration order.
//!
//! # Overview
//!
//! A handler is described by a [`HandlerDescriptor`]:
//! 1. **Matching** - a command matches `<prefix><name>` or `<prefix><alias>` as the
//!    first whitespace-delimited token, a listener matches every message
//! 2. **Tokenization** - the rest of the message is split into chunks, either on
//!    whitespace or with shell-style quoting ([`Tokenization`])
//! 3. **Grammar** - option and argument rules bind chunks to typed values
//!    ([`grammar`])
//! 4. **Injection** - parsed values and requested context are handed to the body
//!    as one [`Invocation`]
//! 5. **Validation** - an optional [`ChannelValidator`] may skip the body
//! 6. **Body** - the async handler itself, returning a [`Flow`]
//!
//! Every matched handler runs inside an [`InvocationScope`] wrapping a store
//! session, released exactly once whatever happens to the body.
//!
//! # Error Reporting
//!
//! Tokenization and grammar failures are reported to the originating channel (see
//! [`error_response`]) and end the dispatch of the message. Body failures are
//! returned to the caller as [`DispatchError::Body`].
//!
//! # Module Organization
//!
//! - [`descriptor`] - Handler descriptors, [`Flow`] and [`ContextParam`]
//! - [`dispatcher`] - The dispatch loop
//! - [`error_response`] - Chat messages sent on parse failures
//! - [`grammar`] - Option and argument rules
//! - [`injector`] - Assembly of the [`Invocation`] handed to bodies
//! - [`registry`] - Ordered handler and alias tables
//! - [`scope`] - Invocation scopes over store sessions
//! - [`tokenizer`] - Head splitting and chunking
//! - [`validator`] - Channel validators

mod descriptor;
mod dispatcher;
pub mod error_response;
pub mod grammar;
mod injector;
mod registry;
mod scope;
mod tokenizer;
mod validator;

use thiserror::Error;

pub use crate::dispatch::{
    descriptor::{ContextParam, Flow, HandlerDescriptor},
    dispatcher::{DispatchSummary, Dispatcher},
    injector::{ContextSources, Invocation, inject},
    registry::{EventCategory, Registry, RegistryBuilder, RegistryError},
    scope::InvocationScope,
    tokenizer::{Tokenization, TokenizationError, split_head},
    validator::{ChannelValidator, only, validator},
};

/// Errors surfaced by [`Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler body returned an error
    #[error("handler `{handler}` failed: {source}")]
    Body {
        handler: String,
        #[source]
        source: anyhow::Error,
    },
    /// A parse failure could not be reported to its channel
    #[error("unable to report an error in channel `{channel}`: {source}")]
    Report {
        channel: String,
        #[source]
        source: anyhow::Error,
    },
}
