//! Diagnostics for the parse and check phases.
//!
//! Both phases share one reporting discipline: a diagnostic is recorded with
//! a `panic_mode` gate so a single malformed construct produces a single
//! message, and the gate is cleared at statement boundaries. A phase either
//! completes cleanly or ends with `had_error` set and at least one
//! diagnostic recorded.
//!
//! The rendered format is fixed:
//! `[line N] Error[ at '<lexeme>'|' at end']: <message>`

use std::fmt;

use thiserror::Error;

use crate::lexer::{Token, TokenKind};

/// Marker error for a parse failure that has already been reported.
///
/// Carrying the message here would duplicate the reporter's record; callers
/// only use this to unwind to the nearest synchronization point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parse error")]
pub struct ParseError;

/// Result alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Where a diagnostic points within its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a specific lexeme
    At(String),
    /// At the end of the input
    AtEnd,
    /// No location quote (lexical errors carry their own message)
    Bare,
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-indexed source line
    pub line: usize,
    /// Location within the line
    pub location: ErrorLocation,
    /// The message text
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;

        match &self.location {
            ErrorLocation::At(lexeme) => write!(f, " at '{lexeme}'")?,
            ErrorLocation::AtEnd => write!(f, " at end")?,
            ErrorLocation::Bare => {}
        }

        write!(f, ": {}", self.message)
    }
}

/// Collects diagnostics with panic-mode suppression.
///
/// While `panic_mode` is set, further reports are dropped; callers clear it
/// with [`Reporter::clear_panic`] once they have resynchronized.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
    panic_mode: bool,
}

impl Reporter {
    /// Creates a new empty reporter.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Records a diagnostic unless a previous one put us in panic mode.
    pub fn error(&mut self, line: usize, location: ErrorLocation, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let diagnostic = Diagnostic { line, location, message: String::from(message) };
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Records a diagnostic pointed at a token.
    pub fn error_at_token(&mut self, token: &Token<'_>, message: &str) {
        let location = match token.kind {
            TokenKind::EndOfFile => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Bare,
            _ => ErrorLocation::At(String::from(token.lexeme)),
        };

        self.error(token.line, location, message);
    }

    /// Returns true if any diagnostic has been recorded.
    #[must_use]
    pub const fn had_error(&self) -> bool { self.had_error }

    /// Returns true if reports are currently being suppressed.
    #[must_use]
    pub const fn panic_mode(&self) -> bool { self.panic_mode }

    /// Clears the suppression gate at a synchronization point.
    pub const fn clear_panic(&mut self) { self.panic_mode = false; }

    /// Returns the recorded diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    /// Folds another reporter's record into this one.
    ///
    /// Used when a nested parse (an imported file) finishes and its
    /// diagnostics belong to the enclosing session.
    pub fn absorb(&mut self, other: Self) {
        self.had_error |= other.had_error;
        self.diagnostics.extend(other.diagnostics);
    }

    /// Writes every recorded diagnostic to standard error, one per line.
    pub fn eprint_all(&self) {
        for diagnostic in &self.diagnostics {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{diagnostic}");
            }
        }
    }
}
