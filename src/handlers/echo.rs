//! `echo` and `quote` commands.
//!
//! `echo` repeats its parsed text in the channel it was written in, `quote` repeats
//! the text exactly as typed, quotes and spacing included:
//!
//! ```text
//! !echo "hello   world"       -> hello   world
//! !say --upper hi there       -> HI THERE
//! !echo -m bob -m carol hi    -> @bob @carol hi
//! !quote it's   "as is        -> it's   "as is
//! ```

use anyhow::Context;
use log::debug;

use crate::dispatch::{
    ContextParam, EventCategory, Flow, HandlerDescriptor, Invocation, RegistryBuilder,
    RegistryError, Tokenization,
    grammar::{ArgumentRule, Arity, OptionRule, Value},
};

async fn echo(invocation: Invocation) -> anyhow::Result<Flow> {
    let transport = invocation.transport().context("transport is not injected")?;
    let message = invocation.message().context("message is not injected")?;
    let text = invocation.text("text").unwrap_or_default();

    let text = if invocation.flag("upper") {
        text.to_uppercase()
    } else {
        text.to_string()
    };

    let mentions: Vec<String> = invocation
        .get("mentions")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .map(|name| format!("@{}", name))
        .collect();

    let body = if mentions.is_empty() {
        text
    } else {
        format!("{} {}", mentions.join(" "), text)
    };

    debug!("echoing {:?} in {}", body, message.channel.id);
    transport.send(&message.channel.id, &body).await?;

    Ok(Flow::Stop)
}

async fn quote(invocation: Invocation) -> anyhow::Result<Flow> {
    let transport = invocation.transport().context("transport is not injected")?;
    let message = invocation.message().context("message is not injected")?;
    let raw = invocation.raw().context("raw text is not injected")?;

    if raw.is_empty() {
        transport
            .send(&message.channel.id, "Please give something to quote")
            .await?;
    } else {
        transport.send(&message.channel.id, raw).await?;
    }

    Ok(Flow::Stop)
}

/// Registers the `echo` command with its `say` alias, then the `quote` command.
pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register(
        EventCategory::Message,
        HandlerDescriptor::command("echo", echo)
            .alias("say")
            .option(OptionRule::flag("upper", &["--upper", "-u"]))
            .option(
                OptionRule::new("mentions", &["--mention", "-m"])
                    .arity(Arity::ZeroOrMore)
                    .count_error("`--mention` needs a name"),
            )
            .argument(
                ArgumentRule::new("text")
                    .arity(Arity::RemainderConcatenated)
                    .count_error("Please give something to echo"),
            )
            .requires(&[ContextParam::Transport, ContextParam::Message]),
    )?;

    builder.register(
        EventCategory::Message,
        HandlerDescriptor::command("quote", quote)
            .tokenization(Tokenization::Plain)
            .requires(&[
                ContextParam::Transport,
                ContextParam::Message,
                ContextParam::Raw,
            ]),
    )
}
