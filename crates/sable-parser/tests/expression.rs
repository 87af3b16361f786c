//! Tests for expression parsing.

use sable_ast::nodes::{BinaryOp, LiteralValue, NodeId, UnaryOp};
use sable_ast::{AnyNode, Ast};
use sable_parser::Parser;

fn parse_expr(source: &str) -> (Ast, NodeId) {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expression().expect("expression failed to parse");
    assert!(!parser.reporter().had_error(), "unexpected diagnostics for {source:?}");
    let (ast, _) = parser.into_parts();

    (ast, expr)
}

fn diagnostics_for(source: &str) -> Vec<String> {
    let mut parser = Parser::new(source);
    let outcome = parser.parse_program();
    let messages: Vec<String> =
        parser.reporter().diagnostics().iter().map(ToString::to_string).collect();
    assert!(outcome.is_none(), "expected a parse failure for {source:?}");

    messages
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn number_literal() {
    let (ast, expr) = parse_expr("42");

    assert!(matches!(
        ast.get(expr),
        Some(AnyNode::Literal(lit)) if lit.value == LiteralValue::Number(42.0)
    ));
}

#[test]
fn string_literal_strips_quotes() {
    let (ast, expr) = parse_expr("\"hello\"");

    assert!(matches!(
        ast.get(expr),
        Some(AnyNode::Literal(lit)) if lit.value == LiteralValue::Str(String::from("hello"))
    ));
}

#[test]
fn atom_literal_strips_prefix() {
    let (ast, expr) = parse_expr("#ok");

    assert!(matches!(
        ast.get(expr),
        Some(AnyNode::Literal(lit)) if lit.value == LiteralValue::Atom(String::from("ok"))
    ));
}

#[test]
fn keyword_literals() {
    for (source, expected) in [
        ("true", LiteralValue::Bool(true)),
        ("false", LiteralValue::Bool(false)),
        ("nil", LiteralValue::Nil),
    ] {
        let (ast, expr) = parse_expr(source);
        assert!(matches!(ast.get(expr), Some(AnyNode::Literal(lit)) if lit.value == expected));
    }
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn factor_binds_tighter_than_term() {
    // a + b * c parses as a + (b * c)
    let (ast, expr) = parse_expr("a + b * c");

    let Some(AnyNode::Binary(add)) = ast.get(expr) else {
        panic!("expected binary at root");
    };
    assert_eq!(add.op, BinaryOp::Add);
    assert!(matches!(ast.get(add.left), Some(AnyNode::Variable(_))));
    assert!(matches!(
        ast.get(add.right),
        Some(AnyNode::Binary(mul)) if mul.op == BinaryOp::Mul
    ));
}

#[test]
fn assignment_is_right_associative() {
    // a = b = c parses as a = (b = c)
    let (ast, expr) = parse_expr("a = b = c");

    let Some(AnyNode::Assign(outer)) = ast.get(expr) else {
        panic!("expected assignment at root");
    };
    assert_eq!(outer.name.text, "a");
    assert!(matches!(
        ast.get(outer.value),
        Some(AnyNode::Assign(inner)) if inner.name.text == "b"
    ));
}

#[test]
fn and_binds_tighter_than_or() {
    // a or b and c parses as a or (b and c)
    let (ast, expr) = parse_expr("a or b and c");

    let Some(AnyNode::Binary(or)) = ast.get(expr) else {
        panic!("expected binary at root");
    };
    assert_eq!(or.op, BinaryOp::Or);
    assert!(matches!(
        ast.get(or.right),
        Some(AnyNode::Binary(and)) if and.op == BinaryOp::And
    ));
}

#[test]
fn unary_not_covers_property_access() {
    // !x.y parses as !(x.y)
    let (ast, expr) = parse_expr("!x.y");

    let Some(AnyNode::Unary(not)) = ast.get(expr) else {
        panic!("expected unary at root");
    };
    assert_eq!(not.op, UnaryOp::Not);
    assert!(matches!(ast.get(not.right), Some(AnyNode::Get(_))));
}

#[test]
fn comparison_and_equality_nest() {
    // a < b == c < d parses as (a < b) == (c < d)
    let (ast, expr) = parse_expr("a < b == c < d");

    let Some(AnyNode::Binary(eq)) = ast.get(expr) else {
        panic!("expected binary at root");
    };
    assert_eq!(eq.op, BinaryOp::Equal);
    assert!(matches!(
        ast.get(eq.left),
        Some(AnyNode::Binary(lt)) if lt.op == BinaryOp::Less
    ));
    assert!(matches!(
        ast.get(eq.right),
        Some(AnyNode::Binary(lt)) if lt.op == BinaryOp::Less
    ));
}

// ============================================================================
// Calls, indexing, containers
// ============================================================================

#[test]
fn call_with_arguments() {
    let (ast, expr) = parse_expr("f(1, 2)");

    let Some(AnyNode::Call(call)) = ast.get(expr) else {
        panic!("expected a call");
    };
    assert_eq!(call.args.len(), 2);
}

#[test]
fn call_allows_trailing_comma() {
    let (ast, expr) = parse_expr("f(1, 2,)");

    let Some(AnyNode::Call(call)) = ast.get(expr) else {
        panic!("expected a call");
    };
    assert_eq!(call.args.len(), 2);
}

#[test]
fn call_rejects_more_than_255_arguments() {
    let args: Vec<String> = (0..260).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));
    let messages = diagnostics_for(&source);

    assert!(messages.iter().any(|m| m.contains("Can't have more than 255 arguments.")));
}

#[test]
fn get_item_parses_index() {
    let (ast, expr) = parse_expr("xs[0]");

    assert!(matches!(ast.get(expr), Some(AnyNode::GetItem(_))));
}

#[test]
fn list_and_map_literals() {
    let (ast, expr) = parse_expr("[1, 2, 3]");
    assert!(matches!(
        ast.get(expr),
        Some(AnyNode::List(list)) if list.items.len() == 3
    ));

    let (ast, expr) = parse_expr("{1: \"a\", 2: \"b\"}");
    let Some(AnyNode::Map(map)) = ast.get(expr) else {
        panic!("expected a map");
    };
    assert_eq!(map.keys.len(), 2);
    assert_eq!(map.values.len(), 2);
}

#[test]
fn dot_access_and_assignment() {
    let (ast, expr) = parse_expr("obj.field");
    assert!(matches!(ast.get(expr), Some(AnyNode::Get(_))));

    let (ast, expr) = parse_expr("obj.field = 1");
    assert!(matches!(ast.get(expr), Some(AnyNode::Set(_))));
}

// ============================================================================
// Pipes
// ============================================================================

#[test]
fn pipe_inserts_left_operand_first() {
    // x | f(y) produces a call with arguments [x, y]
    let (ast, expr) = parse_expr("x | f(y)");

    let Some(AnyNode::Call(call)) = ast.get(expr) else {
        panic!("expected a call");
    };
    assert_eq!(call.args.len(), 2);
    assert!(matches!(
        ast.get(call.args[0]),
        Some(AnyNode::Variable(var)) if var.name.text == "x"
    ));
    assert!(matches!(
        ast.get(call.args[1]),
        Some(AnyNode::Variable(var)) if var.name.text == "y"
    ));
}

#[test]
fn pipe_requires_a_call_on_the_right() {
    let messages = diagnostics_for("x | 3;");

    assert!(
        messages.iter().any(|m| m.contains("Expected functional call after pipe operator")),
        "got {messages:?}"
    );
}

// ============================================================================
// Assignment target gate
// ============================================================================

#[test]
fn invalid_assignment_target_is_rejected() {
    let messages = diagnostics_for("a + b = c;");

    assert!(messages.iter().any(|m| m.contains("Invalid assignment target.")), "got {messages:?}");
}

// ============================================================================
// Lambdas, yields, conditionals
// ============================================================================

#[test]
fn lambda_signature_matches_parameter_count() {
    let (ast, expr) = parse_expr("fun (x: Number, y): Number => x + 1");

    let Some(AnyNode::Lambda(lambda)) = ast.get(expr) else {
        panic!("expected a lambda");
    };
    assert_eq!(lambda.params.len(), 2);

    let Some(AnyNode::FunctorType(signature)) = ast.get(lambda.signature) else {
        panic!("expected a functor signature");
    };
    assert_eq!(signature.params.len(), 2);
    assert!(signature.params[0].is_some());
    assert!(signature.params[1].is_none());
}

#[test]
fn lambda_expression_body_becomes_return() {
    let (ast, expr) = parse_expr("fun (x) => x");

    let Some(AnyNode::Lambda(lambda)) = ast.get(expr) else {
        panic!("expected a lambda");
    };
    assert_eq!(lambda.body.len(), 1);
    assert!(matches!(ast.get(lambda.body[0]), Some(AnyNode::Return(_))));
}

#[test]
fn yield_with_directive() {
    let (ast, expr) = parse_expr("yield [1, 0.5]");

    let Some(AnyNode::Yield(yielded)) = ast.get(expr) else {
        panic!("expected a yield");
    };
    assert!(matches!(ast.get(yielded.expr.expect("payload")), Some(AnyNode::List(_))));
}

#[test]
fn if_parses_in_expression_position() {
    let (ast, expr) = parse_expr("if (a) { 1; } else { 2; }");

    assert!(matches!(ast.get(expr), Some(AnyNode::If(node)) if node.else_branch.is_some()));
}
