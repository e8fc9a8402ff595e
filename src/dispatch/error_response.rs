//! Chat-visible error messages emitted by the dispatcher.
//!
//! Only parse failures are reported to the user. Handler bodies format their own
//! responses.

use crate::dispatch::{TokenizationError, grammar::GrammarError};

/// Formats the message sent when quote-aware splitting fails.
///
/// # Examples
///
/// ```
/// # use strea::dispatch::error_response::format_tokenization_error;
/// # let error = strea::dispatch::Tokenization::QuoteAware.split("\"open").unwrap_err();
/// let message = format_tokenization_error(&error);
/// assert!(message.starts_with("*Error*: Can not parse this command"));
/// ```
pub fn format_tokenization_error(error: &TokenizationError) -> String {
    format!("*Error*: Can not parse this command ({})", error)
}

/// Formats the message sent when an option or argument rule fails.
pub fn format_grammar_error(error: &GrammarError) -> String {
    format!("*Error*\n{}", error)
}
