//! Declaration and statement parsing.
//!
//! Declarations dispatch on a leading keyword and fall through to
//! statements; statements fall through to expression statements. Parse
//! failures unwind to [`Parser::declaration`], which resynchronizes at the
//! next statement boundary so one bad construct costs one diagnostic.

use sable_ast::nodes::{
    BlockStmt,
    BreakStmt,
    ClassStmt,
    EnumItemStmt,
    EnumStmt,
    ExpressionStmt,
    ForStmt,
    FunctionKind,
    FunctionStmt,
    Ident,
    ImportStmt,
    InterfaceStmt,
    LiteralExpr,
    LiteralValue,
    MethodSigStmt,
    NodeId,
    Param,
    ReturnStmt,
    TypeDeclStmt,
    VarStmt,
    WhileStmt,
};
use sable_ast::AnyNode;

use super::Parser;
use crate::diagnostics::{ParseError, ParseResult};
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parse one declaration, recovering at a statement boundary on error.
    ///
    /// Returns `None` when the declaration failed and was skipped.
    pub(crate) fn declaration(&mut self) -> Option<NodeId> {
        let result = if self.try_match(TokenKind::Class) {
            self.class_declaration()
        } else if self.try_match(TokenKind::Fun) {
            self.fun_declaration()
        } else if self.try_match(TokenKind::Var) {
            self.var_declaration()
        } else if self.try_match(TokenKind::Interface) {
            self.interface_declaration()
        } else if self.try_match(TokenKind::Type) {
            self.type_declaration()
        } else if self.try_match(TokenKind::Enum) {
            self.enum_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(id) => Some(id),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    /// Parse one statement.
    pub(crate) fn statement(&mut self) -> ParseResult<NodeId> {
        let result = if self.try_match(TokenKind::Return) {
            self.return_statement()
        } else if self.try_match(TokenKind::While) {
            self.while_statement()
        } else if self.try_match(TokenKind::For) {
            self.for_statement()
        } else if self.try_match(TokenKind::Break) {
            self.break_statement()
        } else if self.try_match(TokenKind::LeftBrace) {
            self.block()
        } else if self.try_match(TokenKind::Import) {
            self.import_statement()
        } else {
            self.expression_statement()
        }?;

        while self.try_match(TokenKind::Semicolon) {}

        Ok(result)
    }

    fn expression_statement(&mut self) -> ParseResult<NodeId> {
        let line = self.current_token().line;
        let expr = self.expression()?;
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Expression(ExpressionStmt { expr, line })))
    }

    /// Parse a brace-delimited block; the `{` has been consumed.
    fn block(&mut self) -> ParseResult<NodeId> {
        let statements = self.brace_block_body()?;

        Ok(self.alloc(AnyNode::Block(BlockStmt { statements })))
    }

    /// Parse statements up to the closing `}`, which is consumed.
    pub(crate) fn brace_block_body(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::EndOfFile) {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ------------------------------------------------------------------
    // Variable and type declarations
    // ------------------------------------------------------------------

    /// `var name (: type)? (= expr)? ;?`; at least one of type and
    /// initializer must be present.
    pub(crate) fn var_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let name = self.previous_ident();

        let annotation =
            if self.try_match(TokenKind::Colon) { Some(self.type_annotation()?) } else { None };
        let initializer =
            if self.try_match(TokenKind::Equal) { Some(self.expression()?) } else { None };

        if annotation.is_none() && initializer.is_none() {
            self.error_at_current("Var without initializer must provide a type!");
            return Err(ParseError);
        }

        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Var(VarStmt { name, annotation, initializer })))
    }

    /// `name : type ;?`, an interface field with a mandatory annotation.
    fn field_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let name = self.previous_ident();
        self.consume(TokenKind::Colon, "Expect type annotation")?;
        let annotation = Some(self.type_annotation()?);
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Var(VarStmt { name, annotation, initializer: None })))
    }

    /// `type Name generics? = type ;?`
    fn type_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect type name.")?;
        let name = self.previous_ident();

        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        self.consume(TokenKind::Equal, "Expect '=' after type name.")?;
        let target = Some(self.type_annotation()?);
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::TypeDecl(TypeDeclStmt { name, generics, target })))
    }

    // ------------------------------------------------------------------
    // Functions, classes, interfaces
    // ------------------------------------------------------------------

    fn fun_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect function name.")?;
        let name = self.previous_ident();

        self.function(name, FunctionKind::Function)
    }

    /// Parse the remainder of a function after its name.
    fn function(&mut self, name: Ident, kind: FunctionKind) -> ParseResult<NodeId> {
        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let (params, _types) = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        let return_annotation =
            if self.try_match(TokenKind::Colon) { Some(self.type_annotation()?) } else { None };

        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.brace_block_body()?;

        Ok(self.alloc(AnyNode::Function(FunctionStmt {
            name,
            params,
            return_annotation,
            generics,
            body,
            kind,
        })))
    }

    /// Parse a comma-separated parameter list up to (not including) `)`.
    ///
    /// Returns the parameters plus the parallel annotation vector used for
    /// lambda signatures; at most 255 parameters.
    pub(crate) fn parameter_list(&mut self) -> ParseResult<(Vec<Param>, Vec<Option<NodeId>>)> {
        let mut params = Vec::new();
        let mut types = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() == 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                }

                self.consume(TokenKind::Identifier, "Expect parameter name.")?;
                let name = self.previous_ident();

                let annotation = if self.try_match(TokenKind::Colon) {
                    Some(self.type_annotation()?)
                } else {
                    None
                };

                params.push(Param { name, annotation });
                types.push(annotation);

                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok((params, types))
    }

    /// Parse a class member method (`fun name ...`).
    fn method(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Fun, "Expect 'var' or 'fun' keyword.")?;
        self.consume(TokenKind::Identifier, "Expect method name.")?;
        let name = self.previous_ident();

        let kind = if name.text == "init" { FunctionKind::Initializer } else { FunctionKind::Method };

        self.function(name, kind)
    }

    fn class_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect class name.")?;
        let name = self.previous_ident();

        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        let mut superclass = None;
        if self.try_match(TokenKind::Extends) {
            self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            let parent = self.previous_ident();
            if parent.text == name.text {
                self.error("A class can't inherit from itself.");
            }
            superclass = Some(parent);
        }

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::EndOfFile) {
            if self.try_match(TokenKind::Var) {
                body.push(self.var_declaration()?);
            } else {
                body.push(self.method()?);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;

        Ok(self.alloc(AnyNode::Class(ClassStmt { name, superclass, generics, body })))
    }

    /// Parse a bodiless method signature inside an interface.
    fn method_signature(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Fun, "Expect 'fun' in interface body.")?;
        self.consume(TokenKind::Identifier, "Expect method name.")?;
        let name = self.previous_ident();

        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        let kind = if name.text == "init" { FunctionKind::Initializer } else { FunctionKind::Method };

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let (params, _types) = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        let return_annotation =
            if self.try_match(TokenKind::Colon) { Some(self.type_annotation()?) } else { None };
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::MethodSig(MethodSigStmt {
            name,
            params,
            return_annotation,
            generics,
            kind,
        })))
    }

    fn interface_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect an interface name.")?;
        let name = self.previous_ident();

        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        let mut super_interface = None;
        if self.try_match(TokenKind::Extends) {
            self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            let parent = self.previous_ident();
            if parent.text == name.text {
                self.error("An interface can't extend from itself.");
            }
            super_interface = Some(parent);
        }

        self.consume(TokenKind::LeftBrace, "Expect '{' before interface body.")?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::EndOfFile) {
            if self.try_match(TokenKind::Var) {
                body.push(self.field_declaration()?);
            } else {
                body.push(self.method_signature()?);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after interface body.")?;

        Ok(self.alloc(AnyNode::Interface(InterfaceStmt { name, super_interface, generics, body })))
    }

    fn enum_declaration(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect enum name.")?;
        let name = self.previous_ident();

        self.consume(TokenKind::LeftBrace, "Expect '{' before enum body.")?;

        let mut items = Vec::new();
        if !self.check(TokenKind::RightBrace) {
            loop {
                if self.check(TokenKind::RightBrace) {
                    break;
                }
                self.consume(TokenKind::Identifier, "Expect enum item name.")?;
                let item = self.previous_ident();
                items.push(self.alloc(AnyNode::EnumItem(EnumItemStmt { name: item })));
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after enum body.")?;
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Enum(EnumStmt { name, items })))
    }

    // ------------------------------------------------------------------
    // Simple statements
    // ------------------------------------------------------------------

    fn return_statement(&mut self) -> ParseResult<NodeId> {
        let line = self.previous_token().line;

        if self.try_match(TokenKind::Semicolon) {
            return Ok(self.alloc(AnyNode::Return(ReturnStmt { value: None, line })));
        }

        let value = self.expression()?;
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Return(ReturnStmt { value: Some(value), line })))
    }

    fn break_statement(&mut self) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Break(BreakStmt { line })))
    }

    fn while_statement(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;

        let body = self.statement()?;

        Ok(self.alloc(AnyNode::While(WhileStmt { condition, body })))
    }

    /// `for '(' init? ';' cond? ';' incr? ')' stmt`; the initializer is a
    /// `;`, a `var` declaration, or an expression statement.
    fn for_statement(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.try_match(TokenKind::Semicolon) {
            None
        } else if self.try_match(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let mut condition = None;
        if !self.try_match(TokenKind::Semicolon) {
            condition = Some(self.expression()?);
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;
        }

        let mut increment = None;
        if !self.try_match(TokenKind::RightParen) {
            increment = Some(self.expression()?);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;
        }

        let body = self.statement()?;

        Ok(self.alloc(AnyNode::For(ForStmt { initializer, condition, increment, body })))
    }

    /// `import "path" as Name ;?`
    fn import_statement(&mut self) -> ParseResult<NodeId> {
        self.consume(TokenKind::String, "Expect '\"' after import.")?;
        let token = *self.previous_token();
        let text = String::from(&token.lexeme[1..token.lexeme.len() - 1]);
        let path = self.alloc(AnyNode::Literal(LiteralExpr {
            value: LiteralValue::Str(text),
            line: token.line,
        }));

        self.consume(TokenKind::As, "Expect 'as' after import path.")?;
        self.consume(TokenKind::Identifier, "Expect name after 'as' in import.")?;
        let name = self.previous_ident();
        let _ = self.try_match(TokenKind::Semicolon);

        Ok(self.alloc(AnyNode::Import(ImportStmt { path, name })))
    }
}
