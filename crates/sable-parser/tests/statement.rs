//! Tests for declaration and statement parsing, diagnostics, and recovery.

use sable_ast::nodes::{FunctionKind, NodeId};
use sable_ast::{AnyNode, Ast};
use sable_parser::Parser;

fn parse_program(source: &str) -> (Ast, Vec<NodeId>) {
    let mut parser = Parser::new(source);
    let statements = parser.parse_program().expect("program failed to parse");
    let (ast, _) = parser.into_parts();

    (ast, statements)
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
// Variable declarations
// ============================================================================

#[test]
fn var_with_annotation_and_initializer() {
    let (ast, statements) = parse_program("var x: Number = 1 + 2;");

    assert_eq!(statements.len(), 1);
    let Some(AnyNode::Var(var)) = ast.get(statements[0]) else {
        panic!("expected a var declaration");
    };
    assert_eq!(var.name.text, "x");
    assert!(var.annotation.is_some());
    assert!(var.initializer.is_some());
}

#[test]
fn var_requires_type_or_initializer() {
    let messages = diagnostics_for("var x;");

    assert!(
        messages.iter().any(|m| m.contains("Var without initializer must provide a type!")),
        "got {messages:?}"
    );
}

#[test]
fn var_semicolon_is_optional() {
    let (_, statements) = parse_program("var x = 1 var y = 2");

    assert_eq!(statements.len(), 2);
}

// ============================================================================
// Type annotations
// ============================================================================

#[test]
fn union_annotations_are_right_associated() {
    let (ast, statements) = parse_program("var x: Number | String | Nil = 1;");

    let Some(AnyNode::Var(var)) = ast.get(statements[0]) else {
        panic!("expected a var declaration");
    };
    let Some(AnyNode::UnionType(outer)) = ast.get(var.annotation.expect("annotation")) else {
        panic!("expected a union annotation");
    };
    assert!(matches!(ast.get(outer.left), Some(AnyNode::SimpleType(_))));
    assert!(matches!(ast.get(outer.right), Some(AnyNode::UnionType(_))));
}

#[test]
fn functor_annotation() {
    let (ast, statements) = parse_program("var f: (Number, String) => Nil = nil;");

    let Some(AnyNode::Var(var)) = ast.get(statements[0]) else {
        panic!("expected a var declaration");
    };
    let Some(AnyNode::FunctorType(functor)) = ast.get(var.annotation.expect("annotation")) else {
        panic!("expected a functor annotation");
    };
    assert_eq!(functor.params.len(), 2);
    assert!(functor.return_type.is_some());
}

#[test]
fn generic_functor_annotation() {
    let (ast, statements) = parse_program("var f: <T>(T) => T = nil;");

    let Some(AnyNode::Var(var)) = ast.get(statements[0]) else {
        panic!("expected a var declaration");
    };
    let Some(AnyNode::FunctorType(functor)) = ast.get(var.annotation.expect("annotation")) else {
        panic!("expected a functor annotation");
    };
    assert_eq!(functor.generics.len(), 1);
}

#[test]
fn generic_application_annotation() {
    let (ast, statements) = parse_program("var xs: List<Number> = [];");

    let Some(AnyNode::Var(var)) = ast.get(statements[0]) else {
        panic!("expected a var declaration");
    };
    let Some(AnyNode::SimpleType(simple)) = ast.get(var.annotation.expect("annotation")) else {
        panic!("expected a simple annotation");
    };
    assert_eq!(simple.name.text, "List");
    assert_eq!(simple.generics.len(), 1);
}

#[test]
fn nested_generic_annotation() {
    let (_, statements) = parse_program("var m: Map<String, List<Number>> = {};");

    assert_eq!(statements.len(), 1);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn function_declaration_with_generics() {
    let (ast, statements) = parse_program("fun id<T>(x: T): T { return x; }");

    let Some(AnyNode::Function(function)) = ast.get(statements[0]) else {
        panic!("expected a function declaration");
    };
    assert_eq!(function.name.text, "id");
    assert_eq!(function.generics.len(), 1);
    assert_eq!(function.params.len(), 1);
    assert!(function.return_annotation.is_some());
    assert_eq!(function.kind, FunctionKind::Function);
}

#[test]
fn generic_bound_uses_extends() {
    let (ast, statements) = parse_program("fun f<T extends Number>(x: T): T { return x; }");

    let Some(AnyNode::Function(function)) = ast.get(statements[0]) else {
        panic!("expected a function declaration");
    };
    let Some(AnyNode::TypeDecl(header)) = ast.get(function.generics[0]) else {
        panic!("expected a generic header");
    };
    assert_eq!(header.name.text, "T");
    assert!(header.target.is_some());
}

// ============================================================================
// Classes and interfaces
// ============================================================================

#[test]
fn class_body_holds_fields_and_methods() {
    let source = "class Point { var x: Number; var y: Number; fun init(x: Number, y: Number) { \
                  this.x = x; } fun norm(): Number { return this.x; } }";
    let (ast, statements) = parse_program(source);

    let Some(AnyNode::Class(class)) = ast.get(statements[0]) else {
        panic!("expected a class declaration");
    };
    assert_eq!(class.body.len(), 4);
    assert!(matches!(ast.get(class.body[0]), Some(AnyNode::Var(_))));

    let Some(AnyNode::Function(init)) = ast.get(class.body[2]) else {
        panic!("expected a method");
    };
    assert_eq!(init.kind, FunctionKind::Initializer);
}

#[test]
fn class_cannot_inherit_from_itself() {
    let messages = diagnostics_for("class A extends A { }");

    assert!(
        messages.iter().any(|m| m.contains("A class can't inherit from itself.")),
        "got {messages:?}"
    );
}

#[test]
fn interface_members_are_signatures() {
    let (ast, statements) =
        parse_program("interface Shape { var name: String; fun area(): Number }");

    let Some(AnyNode::Interface(interface)) = ast.get(statements[0]) else {
        panic!("expected an interface declaration");
    };
    assert_eq!(interface.body.len(), 2);
    assert!(matches!(ast.get(interface.body[0]), Some(AnyNode::Var(_))));
    assert!(matches!(ast.get(interface.body[1]), Some(AnyNode::MethodSig(_))));
}

#[test]
fn interface_cannot_extend_itself() {
    let messages = diagnostics_for("interface I extends I { }");

    assert!(
        messages.iter().any(|m| m.contains("An interface can't extend from itself.")),
        "got {messages:?}"
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn for_with_all_clauses() {
    let (ast, statements) =
        parse_program("for (var i = 0; i < 10; i = i + 1) { i; }");

    let Some(AnyNode::For(for_stmt)) = ast.get(statements[0]) else {
        panic!("expected a for statement");
    };
    assert!(for_stmt.initializer.is_some());
    assert!(for_stmt.condition.is_some());
    assert!(for_stmt.increment.is_some());
}

#[test]
fn for_clauses_are_optional() {
    let (ast, statements) = parse_program("for (;;) { break; }");

    let Some(AnyNode::For(for_stmt)) = ast.get(statements[0]) else {
        panic!("expected a for statement");
    };
    assert!(for_stmt.initializer.is_none());
    assert!(for_stmt.condition.is_none());
    assert!(for_stmt.increment.is_none());
}

#[test]
fn while_and_break() {
    let (ast, statements) = parse_program("while (true) { break; }");

    let Some(AnyNode::While(while_stmt)) = ast.get(statements[0]) else {
        panic!("expected a while statement");
    };
    let Some(AnyNode::Block(block)) = ast.get(while_stmt.body) else {
        panic!("expected a block body");
    };
    assert!(matches!(ast.get(block.statements[0]), Some(AnyNode::Break(_))));
}

// ============================================================================
// Imports, type declarations, enums
// ============================================================================

#[test]
fn import_statement() {
    let (ast, statements) = parse_program("import \"lib/geometry\" as Geometry;");

    let Some(AnyNode::Import(import)) = ast.get(statements[0]) else {
        panic!("expected an import statement");
    };
    assert_eq!(import.name.text, "Geometry");
    assert!(matches!(ast.get(import.path), Some(AnyNode::Literal(_))));
}

#[test]
fn type_declaration() {
    let (ast, statements) = parse_program("type Pair<T> = List<T>;");

    let Some(AnyNode::TypeDecl(decl)) = ast.get(statements[0]) else {
        panic!("expected a type declaration");
    };
    assert_eq!(decl.name.text, "Pair");
    assert_eq!(decl.generics.len(), 1);
    assert!(decl.target.is_some());
}

#[test]
fn enum_declaration() {
    let (ast, statements) = parse_program("enum Color { Red, Green, Blue }");

    let Some(AnyNode::Enum(decl)) = ast.get(statements[0]) else {
        panic!("expected an enum declaration");
    };
    assert_eq!(decl.items.len(), 3);
    assert!(matches!(ast.get(decl.items[0]), Some(AnyNode::EnumItem(_))));
}

// ============================================================================
// Diagnostics and recovery
// ============================================================================

#[test]
fn diagnostics_use_the_fixed_format() {
    let messages = diagnostics_for("var 1;");

    assert_eq!(messages[0], "[line 1] Error at '1': Expect variable name.");
}

#[test]
fn diagnostics_point_at_end_of_input() {
    let messages = diagnostics_for("var x = (1 + 2");

    assert!(messages.iter().any(|m| m.contains("at end")), "got {messages:?}");
}

#[test]
fn parser_recovers_at_statement_boundaries() {
    // The bad statement costs one diagnostic; the next one still parses.
    let mut parser = Parser::new("var 1;\nvar ok = 2;");
    let outcome = parser.parse_program();

    assert!(outcome.is_none());
    assert_eq!(parser.reporter().diagnostics().len(), 1);
}

#[test]
fn lexical_errors_surface_their_message() {
    let messages = diagnostics_for("var x = $;");

    assert!(messages.iter().any(|m| m.contains("Unexpected character.")), "got {messages:?}");
}
