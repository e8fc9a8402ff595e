//! Chat transport integration for the bot.
//!
//! The dispatch engine never talks to a chat network directly. It receives
//! [`IncomingMessage`]s from whatever transport drives it and hands handler bodies
//! a [`Transport`] handle so they can answer through the send primitive.
//!
//! # Architecture
//!
//! - [`Transport`] - the send primitive shared by the dispatcher (error reports)
//!   and handler bodies (responses)
//! - [`ConsoleTransport`] - a stdin/stdout transport used by the `strea` binary
//!
//! # Examples
//!
//! ```no_run
//! # use strea::transport::{Channel, IncomingMessage};
//! let message = IncomingMessage {
//!     content: "!echo hello".to_string(),
//!     author: "alice".to_string(),
//!     channel: Channel {
//!         id: "general".to_string(),
//!         name: "general".to_string(),
//!         is_private: false,
//!     },
//! };
//! ```

mod console;

use async_trait::async_trait;
use mockall::automock;

pub use crate::transport::console::ConsoleTransport;

/// Channel a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Transport-level identifier, used to address replies
    pub id: String,
    /// Human readable channel name, used by channel restrictions
    pub name: String,
    /// Whether the channel is a private conversation with the bot
    pub is_private: bool,
}

/// A raw inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Unparsed message text
    pub content: String,
    /// Identifier of the message author
    pub author: String,
    /// Channel the message comes from
    pub channel: Channel,
}

/// Send primitive of a chat transport.
///
/// This trait abstracts message delivery so the dispatcher and handler bodies can be
/// tested with mocks.
#[automock]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `body` to the channel identified by `channel_id`.
    async fn send(&self, channel_id: &str, body: &str) -> anyhow::Result<()>;
}
