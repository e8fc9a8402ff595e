//! Channel validators gating handler execution.
//!
//! A validator is an async predicate over the transport and the originating
//! message. It runs after a successful parse, right before the handler body. A
//! rejection is not an error: the body is skipped and dispatch moves on to the next
//! handler without telling the user anything.

use std::{future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use log::debug;

use crate::transport::{IncomingMessage, Transport};

/// Type-erased channel predicate.
pub type ChannelValidator =
    Arc<dyn Fn(Arc<dyn Transport>, Arc<IncomingMessage>) -> BoxFuture<'static, bool> + Send + Sync>;

/// Wraps an async closure into a [`ChannelValidator`].
///
/// # Examples
///
/// ```
/// # use strea::dispatch::validator;
/// let only_alice = validator(|_transport, message| async move { message.author == "alice" });
/// ```
pub fn validator<F, Fut>(predicate: F) -> ChannelValidator
where
    F: Fn(Arc<dyn Transport>, Arc<IncomingMessage>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move |transport, message| predicate(transport, message).boxed())
}

/// Restricts a handler to the named channels and, when `allow_private` is set, to
/// private conversations.
///
/// # Examples
///
/// ```
/// # use strea::dispatch::only;
/// let simulation_only = only(&["simulation", "test"], true);
/// ```
pub fn only(channels: &[&str], allow_private: bool) -> ChannelValidator {
    let channels: Vec<String> = channels.iter().map(|name| name.to_string()).collect();

    validator(move |_transport, message| {
        let allowed = (allow_private && message.channel.is_private)
            || channels.iter().any(|name| *name == message.channel.name);
        if !allowed {
            debug!(
                "channel `{}` is not one of {:?}",
                message.channel.name, channels
            );
        }
        async move { allowed }
    })
}

/// Runs `validator`, an absent validator always passes.
pub async fn check(
    validator: Option<&ChannelValidator>,
    transport: &Arc<dyn Transport>,
    message: &Arc<IncomingMessage>,
) -> bool {
    match validator {
        Some(validator) => validator(Arc::clone(transport), Arc::clone(message)).await,
        None => true,
    }
}
