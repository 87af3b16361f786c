//! Pratt expression parsing.
//!
//! Each token kind maps to up to three entries: a prefix parselet, an infix
//! parselet, and the infix precedence. [`Parser::parse_precedence`] consumes
//! one prefix, then folds infix operators while their precedence stays at or
//! above the entry level. Assignment is only legal when the entry level
//! permits it; a trailing `=` anywhere else is an invalid assignment target.

use sable_ast::nodes::{
    AssignExpr,
    BinaryExpr,
    BinaryOp,
    CallExpr,
    GetExpr,
    GetItemExpr,
    IfExpr,
    LiteralExpr,
    LiteralValue,
    NodeId,
    ReturnStmt,
    SetExpr,
    SuperExpr,
    ThisExpr,
    UnaryExpr,
    UnaryOp,
    VariableExpr,
    YieldExpr,
};
use sable_ast::AnyNode;

use super::Parser;
use crate::diagnostics::{ParseError, ParseResult};
use crate::lexer::TokenKind;

/// Expression precedence levels, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Not an infix operator
    None,
    /// `=`
    Assignment,
    /// `yield`, `|`
    Yield,
    /// `or`
    Or,
    /// `and`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `>` `<=` `>=`
    Comparison,
    /// `+` `-` `%`
    Term,
    /// `*` `/`
    Factor,
    /// `!` `-`
    Unary,
    /// `.` `()` `[]`
    Call,
    /// Literals and grouping
    Primary,
}

impl Precedence {
    /// The next-tighter precedence level; used for left-associative folds.
    const fn one_higher(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Yield,
            Self::Yield => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

type PrefixFn<'src> = fn(&mut Parser<'src>, bool) -> ParseResult<NodeId>;
type InfixFn<'src> = fn(&mut Parser<'src>, NodeId, bool) -> ParseResult<NodeId>;

/// One row of the precedence table.
struct ParseRule<'src> {
    prefix: Option<PrefixFn<'src>>,
    infix: Option<InfixFn<'src>>,
    precedence: Precedence,
}

impl<'src> ParseRule<'src> {
    const fn new(
        prefix: Option<PrefixFn<'src>>,
        infix: Option<InfixFn<'src>>,
        precedence: Precedence,
    ) -> Self {
        Self { prefix, infix, precedence }
    }
}

impl<'src> Parser<'src> {
    /// Look up the parse rule for a token kind.
    fn rule_for(kind: TokenKind) -> ParseRule<'src> {
        match kind {
            TokenKind::LeftParen => {
                ParseRule::new(Some(Self::grouping), Some(Self::call), Precedence::Call)
            }
            TokenKind::LeftBracket => {
                ParseRule::new(Some(Self::list), Some(Self::get_item), Precedence::Call)
            }
            TokenKind::LeftBrace => ParseRule::new(Some(Self::map), None, Precedence::None),
            TokenKind::Pipe => ParseRule::new(None, Some(Self::pipe_call), Precedence::Yield),
            TokenKind::Dot => ParseRule::new(None, Some(Self::dot), Precedence::Call),
            TokenKind::Minus => {
                ParseRule::new(Some(Self::unary), Some(Self::binary), Precedence::Term)
            }
            TokenKind::Plus | TokenKind::Percent => {
                ParseRule::new(None, Some(Self::binary), Precedence::Term)
            }
            TokenKind::Slash | TokenKind::Star => {
                ParseRule::new(None, Some(Self::binary), Precedence::Factor)
            }
            TokenKind::Bang => ParseRule::new(Some(Self::unary), None, Precedence::None),
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Equality)
            }
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Comparison)
            }
            TokenKind::And => ParseRule::new(None, Some(Self::and_op), Precedence::And),
            TokenKind::Or => ParseRule::new(None, Some(Self::or_op), Precedence::Or),
            TokenKind::Identifier => ParseRule::new(Some(Self::variable), None, Precedence::None),
            TokenKind::Atom => ParseRule::new(Some(Self::atom), None, Precedence::None),
            TokenKind::String => ParseRule::new(Some(Self::string), None, Precedence::None),
            TokenKind::Number => ParseRule::new(Some(Self::number), None, Precedence::None),
            TokenKind::False | TokenKind::True | TokenKind::Nil => {
                ParseRule::new(Some(Self::literal), None, Precedence::None)
            }
            TokenKind::If => ParseRule::new(Some(Self::if_expr), None, Precedence::None),
            TokenKind::Super => ParseRule::new(Some(Self::super_expr), None, Precedence::None),
            TokenKind::This => ParseRule::new(Some(Self::this_expr), None, Precedence::None),
            TokenKind::Yield => ParseRule::new(Some(Self::yield_expr), None, Precedence::None),
            _ => ParseRule::new(None, None, Precedence::None),
        }
    }

    /// Parse an expression, entering at assignment level.
    ///
    /// A `fun` here begins a lambda rather than a declaration.
    pub(crate) fn expression(&mut self) -> ParseResult<NodeId> {
        if self.try_match(TokenKind::Fun) {
            return self.lambda();
        }

        self.parse_precedence(Precedence::Assignment)
    }

    /// The Pratt core: one prefix, then infix folds at or above `precedence`.
    pub(crate) fn parse_precedence(&mut self, precedence: Precedence) -> ParseResult<NodeId> {
        self.advance();

        let Some(prefix) = Self::rule_for(self.previous_token().kind).prefix else {
            self.error("Expect expression.");
            return Err(ParseError);
        };

        let can_assign = precedence <= Precedence::Assignment;
        let mut expr = prefix(self, can_assign)?;

        while precedence <= Self::rule_for(self.current_token().kind).precedence {
            self.advance();

            let Some(infix) = Self::rule_for(self.previous_token().kind).infix else {
                break;
            };
            expr = infix(self, expr, can_assign)?;
        }

        if can_assign && self.try_match(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }

        Ok(expr)
    }

    // ------------------------------------------------------------------
    // Prefix parselets
    // ------------------------------------------------------------------

    fn number(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let token = *self.previous_token();
        let Ok(value) = token.lexeme.parse::<f64>() else {
            self.error("Invalid number literal.");
            return Err(ParseError);
        };

        Ok(self.alloc(AnyNode::Literal(LiteralExpr {
            value: LiteralValue::Number(value),
            line: token.line,
        })))
    }

    fn string(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let token = *self.previous_token();
        let text = String::from(&token.lexeme[1..token.lexeme.len() - 1]);

        Ok(self.alloc(AnyNode::Literal(LiteralExpr {
            value: LiteralValue::Str(text),
            line: token.line,
        })))
    }

    fn atom(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let token = *self.previous_token();
        let text = String::from(&token.lexeme[1..]);

        Ok(self.alloc(AnyNode::Literal(LiteralExpr {
            value: LiteralValue::Atom(text),
            line: token.line,
        })))
    }

    fn literal(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let token = *self.previous_token();
        let value = match token.kind {
            TokenKind::False => LiteralValue::Bool(false),
            TokenKind::True => LiteralValue::Bool(true),
            _ => LiteralValue::Nil,
        };

        Ok(self.alloc(AnyNode::Literal(LiteralExpr { value, line: token.line })))
    }

    fn variable(&mut self, can_assign: bool) -> ParseResult<NodeId> {
        let name = self.previous_ident();

        if can_assign && self.try_match(TokenKind::Equal) {
            let value = self.expression()?;
            return Ok(self.alloc(AnyNode::Assign(AssignExpr { name, value })));
        }

        Ok(self.alloc(AnyNode::Variable(VariableExpr { name })))
    }

    fn grouping(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let expr = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;

        Ok(expr)
    }

    fn unary(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let op = match self.previous_token().kind {
            TokenKind::Bang => UnaryOp::Not,
            _ => UnaryOp::Negate,
        };

        let right = self.parse_precedence(Precedence::Unary)?;

        Ok(self.alloc(AnyNode::Unary(UnaryExpr { op, right })))
    }

    fn list(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let mut items = Vec::new();

        if !self.check(TokenKind::RightBracket) {
            loop {
                if self.check(TokenKind::RightBracket) {
                    break;
                }
                items.push(self.expression()?);
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBracket, "Expect ']' after list items.")?;

        Ok(self.alloc(AnyNode::List(sable_ast::nodes::ListExpr { items, line })))
    }

    fn map(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let mut keys = Vec::new();
        let mut values = Vec::new();

        if !self.check(TokenKind::RightBrace) {
            loop {
                if self.check(TokenKind::RightBrace) {
                    break;
                }
                keys.push(self.expression()?);
                self.consume(TokenKind::Colon, "Expect ':' after map key.")?;
                values.push(self.expression()?);
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after map items.")?;

        Ok(self.alloc(AnyNode::Map(sable_ast::nodes::MapExpr { keys, values, line })))
    }

    fn this_expr(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;

        Ok(self.alloc(AnyNode::This(ThisExpr { line })))
    }

    fn super_expr(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
        self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
        let method = self.previous_ident();

        Ok(self.alloc(AnyNode::Super(SuperExpr { method })))
    }

    fn yield_expr(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        let expr = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_precedence(Precedence::Yield)?)
        };

        Ok(self.alloc(AnyNode::Yield(YieldExpr { expr })))
    }

    fn if_expr(&mut self, _can_assign: bool) -> ParseResult<NodeId> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;

        let then_branch = self.statement()?;
        let else_branch =
            if self.try_match(TokenKind::Else) { Some(self.statement()?) } else { None };

        Ok(self.alloc(AnyNode::If(IfExpr { condition, then_branch, else_branch })))
    }

    // ------------------------------------------------------------------
    // Infix parselets
    // ------------------------------------------------------------------

    fn binary(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let token = *self.previous_token();
        let op = binary_op_for(token.kind);
        let rule = Self::rule_for(token.kind);
        let right = self.parse_precedence(rule.precedence.one_higher())?;

        Ok(self.alloc(AnyNode::Binary(BinaryExpr { op, line: token.line, left, right })))
    }

    fn and_op(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let right = self.parse_precedence(Precedence::And)?;

        Ok(self.alloc(AnyNode::Binary(BinaryExpr { op: BinaryOp::And, line, left, right })))
    }

    fn or_op(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let right = self.parse_precedence(Precedence::Or)?;

        Ok(self.alloc(AnyNode::Binary(BinaryExpr { op: BinaryOp::Or, line, left, right })))
    }

    fn call(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let args = self.argument_list()?;

        Ok(self.alloc(AnyNode::Call(CallExpr { callee: left, args, line })))
    }

    /// Parse a comma-separated argument list up to the closing paren.
    ///
    /// A trailing comma before `)` is allowed; more than 255 arguments is a
    /// diagnostic.
    fn argument_list(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut args = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if self.check(TokenKind::RightParen) {
                    break;
                }
                let arg = self.expression()?;
                if args.len() == 255 {
                    self.error("Can't have more than 255 arguments.");
                }
                args.push(arg);
                if !self.try_match(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Ok(args)
    }

    fn get_item(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let line = self.previous_token().line;
        let index = self.expression()?;
        self.consume(TokenKind::RightBracket, "Expect ']' after index.")?;

        Ok(self.alloc(AnyNode::GetItem(GetItemExpr { object: left, index, line })))
    }

    /// `x | f(y)` re-parses the right side at call precedence, requires a
    /// call, and inserts `x` as argument 0.
    fn pipe_call(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        let target = self.parse_precedence(Precedence::Call)?;

        let Some(AnyNode::Call(_)) = self.ast().get(target) else {
            self.error_at_current("Expected functional call after pipe operator");
            return Err(ParseError);
        };

        if let Some(AnyNode::Call(call)) = self.ast_mut().get_mut(target) {
            call.args.insert(0, left);
        }

        Ok(target)
    }

    fn dot(&mut self, left: NodeId, _can_assign: bool) -> ParseResult<NodeId> {
        self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
        let name = self.previous_ident();

        if self.try_match(TokenKind::Equal) {
            let value = self.expression()?;
            return Ok(self.alloc(AnyNode::Set(SetExpr { object: left, name, value })));
        }

        Ok(self.alloc(AnyNode::Get(GetExpr { object: left, name })))
    }

    // ------------------------------------------------------------------
    // Lambdas
    // ------------------------------------------------------------------

    /// Parse a lambda, after the `fun` keyword has been consumed in
    /// expression position.
    ///
    /// The body is either a brace-delimited block or a single expression,
    /// which is wrapped in a return statement.
    pub(crate) fn lambda(&mut self) -> ParseResult<NodeId> {
        let generics = if self.try_match(TokenKind::Less) {
            self.generic_param_list()?
        } else {
            Vec::new()
        };

        self.consume(TokenKind::LeftParen, "Expect '(' after fun keyword.")?;
        let (params, types) = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        let return_type =
            if self.try_match(TokenKind::Colon) { Some(self.type_annotation()?) } else { None };
        self.consume(TokenKind::Arrow, "Expect '=>' after parameters.")?;

        let body = if self.try_match(TokenKind::LeftBrace) {
            self.brace_block_body()?
        } else {
            let line = self.current_token().line;
            let value = self.expression()?;
            vec![self.alloc(AnyNode::Return(ReturnStmt { value: Some(value), line }))]
        };

        let signature = self.alloc(AnyNode::FunctorType(sable_ast::nodes::FunctorTypeNode {
            params: types,
            return_type,
            generics,
        }));

        Ok(self.alloc(AnyNode::Lambda(sable_ast::nodes::LambdaExpr { params, body, signature })))
    }
}

const fn binary_op_for(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        _ => BinaryOp::GreaterEqual,
    }
}
