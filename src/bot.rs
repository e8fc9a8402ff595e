//! Bot module wiring the dispatch engine to the console transport.
//!
//! This module provides the [`Bot`] implementation that reads messages from the
//! console, dispatches each of them on its own task and logs handler failures.
//!
//! # Message Processing Flow
//!
//! ```text
//! stdin line → IncomingMessage → spawn dispatch → handlers → stdout replies
//! ```
//!
//! # Example
//!
//! ```no_run
//! # use strea::bot::Bot;
//! # use strea::config::Config;
//! # async fn run() -> Result<(), anyhow::Error> {
//! let config = Config::load("config.yaml")?;
//!
//! let bot = Bot::new(config)?;
//! bot.start().await?; // Runs until stdin is closed
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout},
    task::{JoinError, JoinSet},
};

use crate::{
    config::Config,
    dispatch::{DispatchSummary, Dispatcher, EventCategory, RegistryBuilder},
    handlers::register_modules,
    store::{MemoryStore, Store},
    transport::{ConsoleTransport, IncomingMessage, Transport},
};

/// Main bot structure.
///
/// The console is both the message source and the [`Transport`] handlers answer
/// through. Every message is dispatched on a dedicated tokio task, so a slow
/// handler never delays the next message.
pub struct Bot<R = BufReader<Stdin>, W = Stdout> {
    /// Console the messages come from
    console: Arc<ConsoleTransport<R, W>>,

    /// Dispatcher shared by every message task
    dispatcher: Arc<Dispatcher>,

    /// Store backing every invocation scope
    store: Arc<MemoryStore>,
}

impl Bot {
    /// Creates a bot reading stdin and writing stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration names an unknown handler module or if
    /// two handlers collide.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let console = ConsoleTransport::stdio(&config.console);
        Bot::with_console(config, console)
    }
}

impl<R, W> Bot<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a bot over an existing console transport.
    pub fn with_console(
        config: Config,
        console: ConsoleTransport<R, W>,
    ) -> Result<Self, anyhow::Error> {
        let mut builder = RegistryBuilder::new();
        register_modules(&mut builder, &config.handlers)?;
        let registry = Arc::new(builder.build());
        info!(
            "{} message handlers registered, prefix is {:?}",
            registry.len(EventCategory::Message),
            config.prefix
        );

        let console = Arc::new(console);
        let transport: Arc<dyn Transport> = console.clone();
        let store = Arc::new(MemoryStore::new());
        let scopes: Arc<dyn Store> = store.clone();
        let dispatcher = Arc::new(Dispatcher::new(registry, transport, scopes, &config.prefix));

        Ok(Bot {
            console,
            dispatcher,
            store,
        })
    }

    /// Processes console messages until the input is exhausted.
    ///
    /// Messages still being dispatched when the input ends are awaited before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the console fails. Handler failures are logged
    /// and never stop the bot.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let mut tasks = JoinSet::new();

        while let Some(message) = self.console.next_message().await? {
            let dispatcher = Arc::clone(&self.dispatcher);
            tasks.spawn(handle_message(dispatcher, message));

            while let Some(result) = tasks.try_join_next() {
                log_join_error(result);
            }
        }

        info!("console input closed, waiting for {} dispatches", tasks.len());
        while let Some(result) = tasks.join_next().await {
            log_join_error(result);
        }

        info!("{} store sessions opened", self.store.opened_sessions());
        if self.store.active_sessions() > 0 {
            warn!("{} store sessions were never released", self.store.active_sessions());
        }

        Ok(())
    }
}

/// Dispatches one message and logs the outcome.
async fn handle_message(dispatcher: Arc<Dispatcher>, message: IncomingMessage) {
    match dispatcher.dispatch(message).await {
        Ok(DispatchSummary {
            invoked,
            rejected,
            halted,
        }) => {
            debug!(
                "dispatch done: invoked {:?}, rejected {:?}, halted: {}",
                invoked, rejected, halted
            );
        }
        Err(e) => error!("{}", e),
    }
}

fn log_join_error(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("dispatch task failed: {}", e);
    }
}
