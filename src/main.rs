//! strea - A chat bot engine dispatching text commands to registered handlers.
//!
//! strea reads messages, matches them against registered command and listener
//! handlers, parses their arguments with shell-style quoting and runs the matching
//! handlers in order, each inside its own store session.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! prefix: "!"
//! handlers:
//!   - log
//!   - echo
//!   - memo
//!   - sum
//! console:
//!   channel: "memo"
//!   author: "alice"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `STREA_` prefix:
//!
//! ```bash
//! export STREA_PREFIX="?"
//! export STREA_CONSOLE__CHANNEL="test"
//! ```
//!
//! # Usage
//!
//! ```bash
//! strea --config config.yaml
//! ```
//!
//! Every line typed on stdin is a message posted in the configured console channel.
//! Replies are printed on stdout.
//!
//! # Bot Commands
//!
//! With the built-in handler modules loaded:
//!
//! - `!echo [--upper] [--mention <name>]... <text>` (alias `!say`) - Repeat a text
//! - `!quote <text>` - Repeat a text exactly as typed
//! - `!memo <name> [text]` (alias `!m`) - Store or read a note
//! - `!memo --delete <name>` - Forget a note
//! - `!sum [--precision <digits>] [numbers]...` (alias `!add`) - Add up numbers
//!
//! # Architecture
//!
//! - [`bot`] - Console loop spawning one dispatch task per message
//! - [`config`] - YAML configuration file structures and loading with environment variable support
//! - [`dispatch`] - Handler registry, argument grammar and the dispatch loop
//! - [`handlers`] - Built-in handler modules
//! - [`store`] - Transactional store backing invocation scopes
//! - [`transport`] - Send primitive and console transport
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` for verbose output, including every handler match
//!   - Set to `warn` or `error` for minimal logging

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod bot;
mod config;
mod dispatch;
mod handlers;
mod store;
mod transport;

/// Command-line arguments for strea.
///
/// # Examples
///
/// ```bash
/// strea --config config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// Values can be overridden with `STREA_` prefixed environment variables,
    /// nested keys being separated by `__`.
    #[arg(short, long)]
    config: String,
}

/// Main entry point for strea.
///
/// 1. **Logging Setup**: `info` level by default, overridden by `RUST_LOG`
/// 2. **Argument Parsing**: Parses command-line arguments using `clap`
/// 3. **Configuration Loading**: Reads the YAML file and environment overrides
/// 4. **Bot Initialization**: Registers the configured handler modules
/// 5. **Bot Execution**: Dispatches console messages until stdin is closed
///
/// Configuration and registration errors are logged and end the process without
/// panicking.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting strea {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let bot = match Bot::new(config) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {}", e);
            return;
        }
    };

    if let Err(e) = bot.start().await {
        error!("Console loop failed: {}", e);
    }
}
