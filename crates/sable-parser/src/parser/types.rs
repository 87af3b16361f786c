//! Type annotation parsing.
//!
//! Grammar:
//!
//! ```text
//! typeAnn  := simple | '<' genericParams '>' '(' functor | '(' functor | typeAnn '|' typeAnn
//! functor  := (typeAnn (',' typeAnn)*)? ')' '=>' typeAnn
//! simple   := Ident ('<' typeAnn (',' typeAnn)* '>')?
//! generics := '<' (Ident ('extends' typeAnn)? (',' ...)*)? '>'
//! ```
//!
//! Unions are right-associated.

use sable_ast::nodes::{FunctorTypeNode, NodeId, SimpleTypeNode, TypeDeclStmt, UnionTypeNode};
use sable_ast::AnyNode;

use super::Parser;
use crate::diagnostics::{ParseError, ParseResult};
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parse a type annotation after `:`, in a parameter, variable, or
    /// return position.
    pub(crate) fn type_annotation(&mut self) -> ParseResult<NodeId> {
        let left = if self.try_match(TokenKind::Less) {
            let generics = self.generic_param_list()?;
            self.consume(TokenKind::LeftParen, "Expect '(' after generic parameters.")?;
            self.functor_type(generics)?
        } else if self.try_match(TokenKind::LeftParen) {
            self.functor_type(Vec::new())?
        } else if self.try_match(TokenKind::Identifier) {
            self.simple_type()?
        } else {
            self.error("Expect identifier or functor type.");
            return Err(ParseError);
        };

        if !self.try_match(TokenKind::Pipe) {
            return Ok(left);
        }

        let right = self.type_annotation()?;

        Ok(self.alloc(AnyNode::UnionType(UnionTypeNode { left, right })))
    }

    /// Parse a functor type after its `(` has been consumed.
    fn functor_type(&mut self, generics: Vec<NodeId>) -> ParseResult<NodeId> {
        let mut params = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(Some(self.type_annotation()?));
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after functor type arguments.")?;
        self.consume(TokenKind::Arrow, "Expect '=>' after functor type arguments.")?;

        let return_type = Some(self.type_annotation()?);

        Ok(self.alloc(AnyNode::FunctorType(FunctorTypeNode { params, return_type, generics })))
    }

    /// Parse a named type, optionally applied to generic arguments; the
    /// name has been consumed.
    fn simple_type(&mut self) -> ParseResult<NodeId> {
        let name = self.previous_ident();
        let mut generics = Vec::new();

        if self.try_match(TokenKind::Less) {
            loop {
                generics.push(self.type_annotation()?);
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::Greater, "Expect '>' after generic type argument.")?;
        }

        Ok(self.alloc(AnyNode::SimpleType(SimpleTypeNode { name, generics })))
    }

    /// Parse a generic parameter list after its `<` has been consumed.
    ///
    /// Each parameter becomes a [`TypeDeclStmt`] header whose `target` is
    /// the optional `extends` bound. An empty list is allowed.
    pub(crate) fn generic_param_list(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut generics = Vec::new();

        if self.try_match(TokenKind::Greater) {
            return Ok(generics);
        }

        loop {
            self.consume(TokenKind::Identifier, "Expected identifier in generic argument list.")?;
            let name = self.previous_ident();

            let target =
                if self.try_match(TokenKind::Extends) { Some(self.type_annotation()?) } else { None };

            generics.push(self.alloc(AnyNode::TypeDecl(TypeDeclStmt {
                name,
                generics: Vec::new(),
                target,
            })));

            if !self.try_match(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Greater, "Expected '>' after generic argument list.")?;

        Ok(generics)
    }
}
