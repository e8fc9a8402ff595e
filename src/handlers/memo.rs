//! `memo` command.
//!
//! Stores short notes per author through the invocation scope:
//!
//! ```text
//! !memo groceries eggs and milk   -> stores the note
//! !memo groceries                 -> reads it back
//! !m --delete groceries           -> forgets it
//! ```
//!
//! Everything following the memo name is the note.
//!
//! The command only answers in the `memo` and `test` channels and in private
//! conversations. Anywhere else it is silently skipped.

use anyhow::Context;
use log::debug;

use crate::dispatch::{
    ContextParam, EventCategory, Flow, HandlerDescriptor, Invocation, RegistryBuilder,
    RegistryError,
    grammar::{ArgumentRule, OptionRule},
    only,
};

/// Store key of a note.
fn note_key(author: &str, key: &str) -> String {
    format!("memo:{}:{}", author, key)
}

async fn memo(invocation: Invocation) -> anyhow::Result<Flow> {
    let transport = invocation.transport().context("transport is not injected")?;
    let message = invocation.message().context("message is not injected")?;
    let session = invocation.session().context("scope is not injected")?;
    let key = invocation.text("key").context("key is not bound")?;
    let text = invocation.remainder().unwrap_or_default().join(" ");
    let store_key = note_key(&message.author, key);

    let reply = if invocation.flag("delete") {
        session.delete(&store_key)?;
        session.commit()?;
        debug!("deleted {}", store_key);
        format!("Forgot `{}`", key)
    } else if !text.is_empty() {
        session.put(&store_key, &text)?;
        session.commit()?;
        debug!("stored {}", store_key);
        format!("Noted `{}`", key)
    } else {
        match session.get(&store_key) {
            Some(note) => format!("`{}`: {}", key, note),
            None => format!("Nothing noted under `{}`", key),
        }
    };

    transport.send(&message.channel.id, &reply).await?;

    Ok(Flow::Stop)
}

/// Registers the `memo` command and its `m` alias.
pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register(
        EventCategory::Message,
        HandlerDescriptor::command("memo", memo)
            .alias("m")
            .channels(only(&["memo", "test"], true))
            .option(OptionRule::flag("delete", &["--delete", "-d"]))
            .argument(ArgumentRule::new("key").count_error("Please give a memo name"))
            .requires(&[
                ContextParam::Transport,
                ContextParam::Message,
                ContextParam::Scope,
                ContextParam::Remainder,
            ]),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        dispatch::Dispatcher,
        store::{MemoryStore, Store},
        transport::{Channel, IncomingMessage, MockTransport},
    };

    type Replies = Arc<Mutex<Vec<String>>>;

    fn recording_transport(replies: &Replies) -> MockTransport {
        let replies = Arc::clone(replies);
        let mut transport = MockTransport::new();
        transport.expect_send().returning(move |_, body| {
            replies.lock().unwrap().push(body.to_string());
            Ok(())
        });
        transport
    }

    fn create_dispatcher(transport: MockTransport, store: &Arc<MemoryStore>) -> Dispatcher {
        let mut builder = RegistryBuilder::new();
        register(&mut builder).unwrap();
        let store: Arc<dyn Store> = Arc::clone(store) as Arc<dyn Store>;
        Dispatcher::new(Arc::new(builder.build()), Arc::new(transport), store, "!")
    }

    fn message_from(author: &str, channel: &str, is_private: bool, content: &str) -> IncomingMessage {
        IncomingMessage {
            content: content.to_string(),
            author: author.to_string(),
            channel: Channel {
                id: format!("{}-id", channel),
                name: channel.to_string(),
                is_private,
            },
        }
    }

    #[tokio::test]
    async fn test_store_read_and_delete() {
        let replies = Replies::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(recording_transport(&replies), &store);

        for content in [
            "!memo groceries eggs and milk",
            "!m groceries",
            "!memo --delete groceries",
            "!memo groceries",
        ] {
            dispatcher
                .dispatch(message_from("alice", "memo", false, content))
                .await
                .unwrap();
        }

        assert_eq!(
            *replies.lock().unwrap(),
            vec![
                "Noted `groceries`",
                "`groceries`: eggs and milk",
                "Forgot `groceries`",
                "Nothing noted under `groceries`",
            ]
        );
        assert_eq!(store.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_notes_are_per_author() {
        let replies = Replies::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(recording_transport(&replies), &store);

        dispatcher
            .dispatch(message_from("alice", "test", false, "!memo plan secret"))
            .await
            .unwrap();
        dispatcher
            .dispatch(message_from("bob", "test", false, "!memo plan"))
            .await
            .unwrap();

        assert_eq!(replies.lock().unwrap()[1], "Nothing noted under `plan`");
    }

    #[tokio::test]
    async fn test_private_conversation_is_allowed() {
        let replies = Replies::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(recording_transport(&replies), &store);

        let summary = dispatcher
            .dispatch(message_from("alice", "alice-dm", true, "!memo plan"))
            .await
            .unwrap();

        assert_eq!(summary.invoked, vec!["memo"]);
    }

    #[tokio::test]
    async fn test_other_channels_are_skipped_silently() {
        let store = Arc::new(MemoryStore::new());
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let dispatcher = create_dispatcher(transport, &store);

        let summary = dispatcher
            .dispatch(message_from("alice", "general", false, "!memo plan secret"))
            .await
            .unwrap();

        assert_eq!(summary.rejected, vec!["memo"]);
        assert!(summary.invoked.is_empty());
        assert_eq!(store.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let replies = Replies::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(recording_transport(&replies), &store);

        dispatcher
            .dispatch(message_from("alice", "memo", false, "!memo"))
            .await
            .unwrap();

        assert_eq!(*replies.lock().unwrap(), vec!["*Error*\nPlease give a memo name"]);
    }
}
