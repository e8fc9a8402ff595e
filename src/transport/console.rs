//! Console transport reading messages from stdin and printing replies to stdout.
//!
//! Every input line becomes one [`IncomingMessage`] posted in the channel configured
//! in the `console` section of the configuration file. Outgoing messages are
//! written as `[<channel>] <body>` lines.

use async_trait::async_trait;
use log::{debug, info};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout},
    sync::Mutex,
};

use crate::{
    config::Console,
    transport::{Channel, IncomingMessage, Transport},
};

/// Line based transport over an async reader and writer.
///
/// # Examples
///
/// ```no_run
/// # use strea::transport::ConsoleTransport;
/// # use strea::config::Console;
/// # async fn example() -> anyhow::Result<()> {
/// let console = ConsoleTransport::stdio(&Console::default());
/// while let Some(message) = console.next_message().await? {
///     println!("{}: {}", message.author, message.content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConsoleTransport<R = BufReader<Stdin>, W = Stdout> {
    /// Channel every console message is posted in
    channel: Channel,
    /// Author of every console message
    author: String,
    /// Input lines
    lines: Mutex<Lines<R>>,
    /// Output sink
    writer: Mutex<W>,
}

impl ConsoleTransport {
    /// Creates a console transport bound to the process stdin and stdout.
    pub fn stdio(console: &Console) -> Self {
        ConsoleTransport::with_io(
            console,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a console transport over arbitrary reader and writer.
    pub fn with_io(console: &Console, reader: R, writer: W) -> Self {
        info!(
            "console transport posting as `{}` in channel `{}`",
            console.author, console.channel
        );

        ConsoleTransport {
            channel: Channel {
                id: console.channel.clone(),
                name: console.channel.clone(),
                is_private: console.private,
            },
            author: console.author.clone(),
            lines: Mutex::new(reader.lines()),
            writer: Mutex::new(writer),
        }
    }

    /// Waits for the next non-blank input line.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - the next message
    /// * `Ok(None)` - the input is exhausted
    pub async fn next_message(&self) -> anyhow::Result<Option<IncomingMessage>> {
        let mut lines = self.lines.lock().await;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!("console input: {}", line);
            return Ok(Some(IncomingMessage {
                content: line,
                author: self.author.clone(),
                channel: self.channel.clone(),
            }));
        }

        Ok(None)
    }
}

#[async_trait]
impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, channel_id: &str, body: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(format_outgoing(channel_id, body).as_bytes())
            .await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Formats an outgoing message as printed on the console.
fn format_outgoing(channel_id: &str, body: &str) -> String {
    format!("[{}] {}\n", channel_id, body)
}
