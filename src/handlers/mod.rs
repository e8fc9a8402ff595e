//! Built-in handler modules.
//!
//! A handler module registers one or more handlers into the registry. The
//! `handlers` configuration key lists the modules to load, and its order is the
//! registration order.
//!
//! # Available Modules
//!
//! - `log` ([`listener`]) - Logs every message and lets dispatch continue
//! - `echo` ([`echo`]) - `echo`/`say` command repeating its text, `quote` command
//!   repeating it as typed
//! - `memo` ([`memo`]) - `memo`/`m` command storing per-author notes
//! - `sum` ([`sum`]) - `sum`/`add` command adding up numbers

mod echo;
mod listener;
mod memo;
mod sum;

use log::info;

use crate::dispatch::{RegistryBuilder, RegistryError};

/// Registers the handlers of one module.
pub type RegisterFn = fn(&mut RegistryBuilder) -> Result<(), RegistryError>;

/// Every built-in module, by configuration name.
pub const MODULES: &[(&str, RegisterFn)] = &[
    ("log", listener::register),
    ("echo", echo::register),
    ("memo", memo::register),
    ("sum", sum::register),
];

/// Registers the modules named in `names`, in order.
///
/// # Errors
///
/// - [`RegistryError::UnknownModule`] if a name is not a built-in module
/// - Any registration error raised by a module
pub fn register_modules(builder: &mut RegistryBuilder, names: &[String]) -> Result<(), RegistryError> {
    for name in names {
        let register = MODULES
            .iter()
            .find(|(module, _)| module == name)
            .map(|(_, register)| register)
            .ok_or_else(|| RegistryError::UnknownModule(name.clone()))?;

        register(builder)?;
        info!("loaded handler module `{}`", name);
    }

    Ok(())
}
