//! Message tokenization.
//!
//! A message is first split into its head (the would-be command name) and the rest.
//! The rest is then split into chunks according to the matched handler's
//! [`Tokenization`] mode.

use log::trace;
use thiserror::Error;

/// Raised when quote-aware splitting meets unbalanced quoting.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TokenizationError(#[from] shell_words::ParseError);

/// How the text following the command head is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tokenization {
    /// Split on whitespace runs. Never fails.
    Plain,
    /// Shell-style splitting: quotes group chunks containing spaces.
    #[default]
    QuoteAware,
}

impl Tokenization {
    /// Splits `rest` into chunks.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizationError`] when `self` is [`Tokenization::QuoteAware`]
    /// and `rest` has an unterminated quote or a trailing escape.
    ///
    /// # Examples
    ///
    /// ```
    /// # use strea::dispatch::Tokenization;
    /// let chunks = Tokenization::QuoteAware.split(r#"title "with spaces" rest"#).unwrap();
    /// assert_eq!(chunks, vec!["title", "with spaces", "rest"]);
    /// ```
    pub fn split(self, rest: &str) -> Result<Vec<String>, TokenizationError> {
        let chunks = match self {
            // Whitespace runs never yield empty chunks, unlike a split on single spaces
            Tokenization::Plain => rest.split_whitespace().map(str::to_string).collect(),
            Tokenization::QuoteAware => shell_words::split(rest)?,
        };
        trace!("{:?} split {:?} into {:?}", self, rest, chunks);
        Ok(chunks)
    }
}

/// Splits a message into its head and the rest, on the first whitespace run.
///
/// Without any whitespace, the whole text is the head and the rest is empty.
pub fn split_head(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (text, ""),
    }
}
