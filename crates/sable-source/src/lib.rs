//! Source text handling for the Sable programming language.
//!
//! Tokens produced by the lexer borrow slices of the source buffer and carry
//! line numbers; this crate supplies the span and line-table types that make
//! that cheap. Nothing here allocates per token.

pub mod types;

pub use types::{Source, Span};
