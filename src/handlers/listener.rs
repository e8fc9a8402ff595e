//! Passive listener logging every message.

use anyhow::Context;
use log::info;

use crate::dispatch::{
    ContextParam, EventCategory, Flow, HandlerDescriptor, Invocation, RegistryBuilder,
    RegistryError, Tokenization,
};

async fn log_message(invocation: Invocation) -> anyhow::Result<Flow> {
    let message = invocation.message().context("message is not injected")?;

    info!(
        "[{}] <{}> {}",
        message.channel.name, message.author, message.content
    );

    Ok(Flow::Continue)
}

/// Registers the `log` listener.
pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register(
        EventCategory::Message,
        HandlerDescriptor::listener("log", log_message)
            .tokenization(Tokenization::Plain)
            .requires(&[ContextParam::Message]),
    )
}
