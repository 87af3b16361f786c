//! Token definitions for the Sable programming language.
//!
//! [`TokenKind`] is the closed enumeration of lexical categories; the
//! [`super::Lexer`] wrapper attaches lexemes, spans, and line numbers.

use std::fmt::{self, Display, Formatter};

use logos::Logos;
use sable_source::Span;

/// The kind of a token in the Sable language.
///
/// Covers keywords, literals, operators, and delimiters, plus the synthetic
/// `Error` and `EndOfFile` kinds the lexer wrapper produces.
#[derive(Logos, Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("and")]
    And,
    #[token("as")]
    As,
    #[token("break")]
    Break,
    #[token("class")]
    Class,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("nil")]
    Nil,
    #[token("or")]
    Or,
    #[token("return")]
    Return,
    #[token("super")]
    Super,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("type")]
    Type,
    #[token("var")]
    Var,
    #[token("while")]
    While,
    #[token("yield")]
    Yield,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_]*")]
    Atom,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // One- and two-character punctuation
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("%")]
    Percent,
    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,
    #[token("=>")]
    Arrow,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    // Synthetic kinds produced by the lexer wrapper
    /// Lexical error; the token's lexeme carries the message
    Error,
    /// End of input
    EndOfFile,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { write!(f, "{self:?}") }
}

/// A token: a kind, a borrowed slice of the source, and a line number.
///
/// Tokens are immutable and never outlive the source buffer. `Error` tokens
/// carry their message in `lexeme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The lexical category
    pub kind: TokenKind,
    /// The matched source text (or the message, for `Error` tokens)
    pub lexeme: &'src str,
    /// Byte range in the source buffer
    pub span: Span,
    /// 1-indexed source line
    pub line: usize,
}

impl<'src> Token<'src> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, lexeme: &'src str, span: Span, line: usize) -> Self {
        Self { kind, lexeme, span, line }
    }

    /// Creates a token with an empty lexeme, for synthetic kinds.
    #[must_use]
    pub const fn with_empty_lexeme(kind: TokenKind, span: Span, line: usize) -> Self {
        Self { kind, lexeme: "", span, line }
    }
}
