//! `sum` command.
//!
//! Adds up decimal numbers and answers with a fixed number of decimals:
//!
//! ```text
//! !sum 1 2.5              -> 3.50
//! !add -p 0 1.4 2         -> 3
//! ```

use anyhow::Context;
use log::debug;

use crate::dispatch::{
    ContextParam, EventCategory, Flow, HandlerDescriptor, Invocation, RegistryBuilder,
    RegistryError,
    grammar::{ArgumentRule, Arity, OptionRule, Value, ValueKind},
};

const DEFAULT_PRECISION: i64 = 2;
const MAX_PRECISION: i64 = 10;

async fn sum(invocation: Invocation) -> anyhow::Result<Flow> {
    let transport = invocation.transport().context("transport is not injected")?;
    let message = invocation.message().context("message is not injected")?;
    let precision = invocation
        .integer("precision")
        .unwrap_or(DEFAULT_PRECISION)
        .clamp(0, MAX_PRECISION) as usize;

    let numbers = invocation
        .get("numbers")
        .and_then(Value::as_list)
        .unwrap_or_default();
    let total: f64 = numbers.iter().filter_map(Value::as_f64).sum();

    debug!("summed {} numbers to {}", numbers.len(), total);
    transport
        .send(&message.channel.id, &format!("{:.*}", precision, total))
        .await?;

    Ok(Flow::Stop)
}

/// Registers the `sum` command and its `add` alias.
pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register(
        EventCategory::Message,
        HandlerDescriptor::command("sum", sum)
            .alias("add")
            .option(
                OptionRule::new("precision", &["--precision", "-p"])
                    .kind(ValueKind::Integer)
                    .default(Value::Integer(DEFAULT_PRECISION))
                    .error("`--precision` needs a whole number"),
            )
            .argument(
                ArgumentRule::new("numbers")
                    .arity(Arity::ZeroOrMore)
                    .kind(ValueKind::Float)
                    .default(Value::List(vec![Value::Float(0.0)]))
                    .error("Numbers only, please"),
            )
            .requires(&[ContextParam::Transport, ContextParam::Message]),
    )
}
