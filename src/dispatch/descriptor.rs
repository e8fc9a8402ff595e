//! Handler descriptors: matching rule, grammar, context needs and body.

use std::{collections::HashSet, fmt, future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};

use crate::dispatch::{
    ChannelValidator, Invocation, Tokenization,
    grammar::{ArgumentRule, Grammar, OptionRule},
};

/// Tells the dispatcher whether to keep evaluating handlers after a body returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Evaluate the next handlers
    Continue,
    /// Stop evaluating handlers for this message
    Stop,
}

/// Context a handler body can ask the dispatcher to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextParam {
    /// Transport handle, to send responses
    Transport,
    /// Originating message
    Message,
    /// Session of the invocation scope
    Scope,
    /// Text following the command head, before tokenization
    Raw,
    /// Chunks no argument rule consumed
    Remainder,
}

/// Type-erased async handler body.
pub type HandlerBody = Arc<dyn Fn(Invocation) -> BoxFuture<'static, anyhow::Result<Flow>> + Send + Sync>;

/// Static description of one registered handler.
///
/// A command descriptor only matches messages whose head is the configured prefix
/// followed by its name or one of its aliases. A listener descriptor matches every
/// message.
///
/// # Examples
///
/// ```
/// # use strea::dispatch::{ContextParam, Flow, HandlerDescriptor, grammar::ArgumentRule};
/// let ping = HandlerDescriptor::command("ping", |invocation| async move {
///     let transport = invocation.transport().unwrap();
///     let message = invocation.message().unwrap();
///     transport.send(&message.channel.id, "pong").await?;
///     Ok(Flow::Stop)
/// })
/// .alias("p")
/// .requires(&[ContextParam::Transport, ContextParam::Message]);
/// ```
pub struct HandlerDescriptor {
    name: String,
    aliases: Vec<String>,
    is_command: bool,
    tokenization: Tokenization,
    grammar: Grammar,
    context: HashSet<ContextParam>,
    validator: Option<ChannelValidator>,
    body: HandlerBody,
}

impl HandlerDescriptor {
    /// Creates a command descriptor.
    pub fn command<F, Fut>(name: &str, body: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
    {
        HandlerDescriptor::new(name, true, body)
    }

    /// Creates a listener descriptor, run for every message.
    pub fn listener<F, Fut>(name: &str, body: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
    {
        HandlerDescriptor::new(name, false, body)
    }

    fn new<F, Fut>(name: &str, is_command: bool, body: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Flow>> + Send + 'static,
    {
        HandlerDescriptor {
            name: name.to_string(),
            aliases: Vec::new(),
            is_command,
            tokenization: Tokenization::default(),
            grammar: Grammar::default(),
            context: HashSet::new(),
            validator: None,
            body: Arc::new(move |invocation| body(invocation).boxed()),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn tokenization(mut self, tokenization: Tokenization) -> Self {
        self.tokenization = tokenization;
        self
    }

    pub fn option(mut self, rule: OptionRule) -> Self {
        self.grammar = self.grammar.option(rule);
        self
    }

    pub fn argument(mut self, rule: ArgumentRule) -> Self {
        self.grammar = self.grammar.argument(rule);
        self
    }

    /// Declares the context the body needs injected.
    pub fn requires(mut self, params: &[ContextParam]) -> Self {
        self.context.extend(params.iter().copied());
        self
    }

    /// Gates the body behind a channel validator.
    pub fn channels(mut self, validator: ChannelValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_command(&self) -> bool {
        self.is_command
    }

    pub fn tokenization_mode(&self) -> Tokenization {
        self.tokenization
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn context(&self) -> &HashSet<ContextParam> {
        &self.context
    }

    pub fn validator(&self) -> Option<&ChannelValidator> {
        self.validator.as_ref()
    }

    /// Runs the body.
    pub fn call(&self, invocation: Invocation) -> BoxFuture<'static, anyhow::Result<Flow>> {
        (self.body)(invocation)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("is_command", &self.is_command)
            .field("tokenization", &self.tokenization)
            .field("grammar", &self.grammar)
            .field("context", &self.context)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
