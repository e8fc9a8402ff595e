//! Configuration file structures for strea.
//!
//! The configuration is a YAML file merged with environment variable overrides.
//! Every key can be overridden with a `STREA_` prefixed variable, nested keys being
//! separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Command prefix, commands are written `<prefix><name>`
//! prefix: "!"
//!
//! # Handler modules to register, in registration order
//! handlers:
//!   - log
//!   - echo
//!   - memo
//!
//! # Console transport
//! console:
//!   channel: "memo"
//!   author: "alice"
//!   private: false
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export STREA_PREFIX="?"
//! export STREA_CONSOLE__CHANNEL="test"
//! ```

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;
use thiserror::Error;

use crate::handlers;

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("configuration file `{0}` does not exist")]
    Missing(String),
    /// The file or an override could not be read into a [`Config`]
    #[error(transparent)]
    Invalid(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(error))
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```no_run
/// # use strea::config::Config;
/// # fn main() -> Result<(), strea::config::ConfigError> {
/// let config = Config::load("config.yaml")?;
///
/// println!("Prefix: {}", config.prefix);
/// println!("Handlers: {:?}", config.handlers);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Command prefix.
    ///
    /// Used verbatim and may be empty, in which case a command is its bare name.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Handler modules to register.
    ///
    /// The list order is the registration order, and therefore the order in which
    /// handlers are evaluated for every message.
    #[serde(default = "default_handlers")]
    pub handlers: Vec<String>,

    /// Console transport settings
    #[serde(default)]
    pub console: Console,
}

/// Console transport settings.
///
/// # YAML Section
///
/// ```yaml
/// console:
///   channel: "memo"
///   author: "alice"
///   private: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Console {
    /// Name of the channel every console line is posted in
    pub channel: String,
    /// Author of every console line
    pub author: String,
    /// Whether the console channel is a private conversation
    pub private: bool,
}

impl Default for Console {
    fn default() -> Self {
        Console {
            channel: "console".to_string(),
            author: "console".to_string(),
            private: false,
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_handlers() -> Vec<String> {
    handlers::MODULES
        .iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

impl Config {
    /// Loads the configuration from `path`, then applies `STREA_` overrides.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if `path` does not exist
    /// - [`ConfigError::Invalid`] if the YAML is malformed or a value has the wrong type
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::Missing(path.to_string()));
        }

        let config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("STREA_").split("__"))
            .extract()?;

        Ok(config)
    }
}
