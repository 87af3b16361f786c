//! Lexer for the Sable programming language.
//!
//! A thin wrapper around a `logos`-derived token enumeration. The wrapper
//! tracks line numbers (logos skips whitespace, so lines are counted across
//! the gaps between matches) and converts unmatched input into `Error`
//! tokens whose lexeme carries the message, per the scanner contract the
//! parser consumes.

mod token;

use logos::{Lexer as LogosLexer, Logos};
use sable_source::Span;
pub use token::{Token, TokenKind};

/// Streaming lexer over one source buffer.
#[derive(Debug)]
pub struct Lexer<'src> {
    inner: LogosLexer<'src, TokenKind>,
    source: &'src str,
    /// Byte offset where the previous token ended
    last_end: usize,
    /// Current 1-indexed line
    line: usize,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self { inner: TokenKind::lexer(source), source, last_end: 0, line: 1 }
    }

    /// Returns the source being lexed.
    #[must_use]
    pub const fn source(&self) -> &'src str { self.source }

    /// Returns the current line number.
    #[must_use]
    pub const fn line(&self) -> usize { self.line }

    /// Counts the newlines between the previous token and `start`.
    fn advance_line_to(&mut self, start: usize) {
        self.line += self.source[self.last_end..start].bytes().filter(|&b| b == b'\n').count();
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let range = self.inner.span();
        let span = Span::new(range.start, range.end);
        let lexeme = &self.source[range.start..range.end];

        self.advance_line_to(range.start);
        let line = self.line;
        self.last_end = range.end;

        let token = match result {
            Ok(kind) => Token::new(kind, lexeme, span, line),
            Err(()) => {
                // Error tokens carry the message in the lexeme slot.
                let message = if lexeme.starts_with('"') {
                    "Unterminated string."
                } else {
                    "Unexpected character."
                };

                Token::new(TokenKind::Error, message, span, line)
            }
        };

        Some(token)
    }
}
