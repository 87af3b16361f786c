//! Parser module for the Sable programming language.
//!
//! The parser consumes tokens from the lexer and builds nodes in an
//! AST pool it owns. Expressions are parsed with a Pratt precedence table
//! (see [`expressions`]); declarations and statements use recursive descent
//! (see [`statements`]); type annotations have their own small grammar
//! (see [`types`]).
//!
//! Error recovery is panic-mode based: a failed construct reports one
//! diagnostic, unwinds to the enclosing declaration, and the parser
//! resynchronizes at a statement boundary.

mod expressions;
mod statements;
mod types;

pub use expressions::Precedence;
use sable_ast::nodes::{Ident, NodeId};
use sable_ast::Ast;
use sable_source::Span;

use crate::diagnostics::{ParseError, ParseResult, Reporter};
use crate::lexer::{Lexer, Token, TokenKind};

/// The Sable parser.
///
/// Owns the AST pool it allocates into; callers take it back with
/// [`Parser::into_parts`] once parsing finishes.
#[derive(Debug)]
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    /// The most recently consumed token
    previous: Token<'src>,
    /// The token under the cursor
    current: Token<'src>,
    ast: Ast,
    reporter: Reporter,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source code.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let lexer = Lexer::new(source);
        let placeholder = Token::with_empty_lexeme(TokenKind::Error, Span::default(), 1);

        let mut parser = Self {
            lexer,
            previous: placeholder,
            current: placeholder,
            ast: Ast::new(),
            reporter: Reporter::new(),
        };

        // Prime the cursor; `previous` is meaningless until the first real
        // advance inside the grammar.
        parser.advance();

        parser
    }

    /// Parse a whole program.
    ///
    /// Returns the top-level statement list, or `None` when any diagnostic
    /// was reported. The AST pool keeps every allocated node either way.
    pub fn parse_program(&mut self) -> Option<Vec<NodeId>> {
        let mut statements = Vec::new();

        while !self.try_match(TokenKind::EndOfFile) {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        if self.reporter.had_error() { None } else { Some(statements) }
    }

    /// Parse a single expression, for embedding and tests.
    ///
    /// Returns `None` when the expression failed to parse.
    pub fn parse_expression(&mut self) -> Option<NodeId> { self.expression().ok() }

    /// Consumes the parser, returning the AST pool and the reporter.
    #[must_use]
    pub fn into_parts(self) -> (Ast, Reporter) { (self.ast, self.reporter) }

    /// Returns the AST pool.
    #[must_use]
    pub const fn ast(&self) -> &Ast { &self.ast }

    /// Returns mutable access to the AST pool.
    pub(crate) const fn ast_mut(&mut self) -> &mut Ast { &mut self.ast }

    /// Returns the diagnostics reporter.
    #[must_use]
    pub const fn reporter(&self) -> &Reporter { &self.reporter }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    /// Advance to the next token, surfacing scanner errors as diagnostics.
    pub(crate) fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.lexer.next().unwrap_or_else(|| {
                let end = self.lexer.source().len();
                Token::with_empty_lexeme(
                    TokenKind::EndOfFile,
                    Span::new(end, end),
                    self.lexer.line(),
                )
            });

            if self.current.kind != TokenKind::Error {
                break;
            }

            // Error tokens carry their message in the lexeme.
            let token = self.current;
            self.reporter.error_at_token(&token, token.lexeme);
        }
    }

    /// Check whether the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool { self.current.kind == kind }

    /// Consume the current token if it has the given kind.
    pub(crate) fn try_match(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();

        true
    }

    /// Consume the current token, requiring the given kind.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<()> {
        if self.check(kind) {
            self.advance();
            return Ok(());
        }

        self.error_at_current(message);

        Err(ParseError)
    }

    /// Returns the token under the cursor.
    pub(crate) const fn current_token(&self) -> &Token<'src> { &self.current }

    /// Returns the most recently consumed token.
    pub(crate) const fn previous_token(&self) -> &Token<'src> { &self.previous }

    /// Copies the previous token into an owned identifier.
    pub(crate) fn previous_ident(&self) -> Ident {
        Ident::new(String::from(self.previous.lexeme), self.previous.line)
    }

    // ------------------------------------------------------------------
    // Error reporting
    // ------------------------------------------------------------------

    /// Report a diagnostic at the previous token.
    pub(crate) fn error(&mut self, message: &str) {
        let token = self.previous;
        self.reporter.error_at_token(&token, message);
    }

    /// Report a diagnostic at the current token.
    pub(crate) fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.reporter.error_at_token(&token, message);
    }

    /// Skip tokens until a statement boundary, clearing panic mode.
    ///
    /// Boundaries are a consumed semicolon or any token that can begin a
    /// declaration (`class`, `fun`, `var`, `for`, `if`, `while`, `return`).
    pub(crate) fn synchronize(&mut self) {
        self.reporter.clear_panic();

        while !self.check(TokenKind::EndOfFile) {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }

            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    // ------------------------------------------------------------------
    // AST plumbing
    // ------------------------------------------------------------------

    /// Allocates a node in the pool.
    pub(crate) fn alloc(&mut self, node: sable_ast::AnyNode) -> NodeId { self.ast.alloc(node) }
}
