//! Tests for the type checker: declaration checking, subtyping, generics,
//! interfaces, and diagnostics.

use std::collections::HashMap;

use sable_analyzer::{Builtins, Checker, ModuleRegistry, TypeArena, TypeId};
use sable_ast::nodes::NodeId;
use sable_parser::Parser;

/// Parses and checks a program, handing the live checker to `assertions`.
fn with_checker(source: &str, assertions: impl FnOnce(&mut Checker<'_>, &[NodeId])) {
    let mut parser = Parser::new(source);
    let statements = parser.parse_program().expect("program failed to parse");
    let (ast, mut reporter) = parser.into_parts();

    let mut arena = TypeArena::new();
    let builtins = Builtins::install(&mut arena);
    let mut modules = ModuleRegistry::new();
    let mut checker = Checker::new(&ast, &mut arena, builtins, &mut modules, &mut reporter);

    assertions(&mut checker, &statements);
}

/// Parses and checks a program, returning the rendered diagnostics and the
/// top-level value bindings.
fn check_source(source: &str) -> (Vec<String>, HashMap<String, TypeId>, Builtins) {
    let mut parser = Parser::new(source);
    let statements = parser.parse_program().expect("program failed to parse");
    let (ast, mut reporter) = parser.into_parts();

    let mut arena = TypeArena::new();
    let builtins = Builtins::install(&mut arena);
    let mut modules = ModuleRegistry::new();

    let locals = {
        let mut checker =
            Checker::new(&ast, &mut arena, builtins, &mut modules, &mut reporter);
        checker.check(&statements);
        checker
            .env()
            .global_scope()
            .locals
            .iter()
            .map(|(name, &ty)| (name.clone(), ty))
            .collect()
    };

    let diagnostics = reporter.diagnostics().iter().map(ToString::to_string).collect();

    (diagnostics, locals, builtins)
}

// ============================================================================
// Declarations and literals
// ============================================================================

#[test]
fn var_with_matching_annotation_checks_clean() {
    let (diagnostics, locals, builtins) = check_source("var x: Number = 1 + 2;");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
    assert_eq!(locals.get("x"), Some(&builtins.number));
}

#[test]
fn var_with_mismatched_annotation_reports_on_its_line() {
    let (diagnostics, _, _) = check_source("var x: String = 1;");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0], "[line 1] Error at 'x': Type mismatch in var");
}

#[test]
fn var_without_annotation_infers_from_initializer() {
    let (diagnostics, locals, builtins) = check_source("var x = \"hi\"; var b = true;");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
    assert_eq!(locals.get("x"), Some(&builtins.string));
    assert_eq!(locals.get("b"), Some(&builtins.bool_));
}

#[test]
fn undefined_variable_is_reported() {
    let (diagnostics, _, _) = check_source("var x = missing;");

    assert!(diagnostics.iter().any(|m| m.contains("Undefined variable")), "got {diagnostics:?}");
}

#[test]
fn undefined_type_is_reported() {
    let (diagnostics, _, _) = check_source("var x: Bogus = 1;");

    assert!(diagnostics.iter().any(|m| m.contains("Undefined type")), "got {diagnostics:?}");
}

#[test]
fn checker_surfaces_multiple_diagnostics() {
    let (diagnostics, _, _) = check_source("var x: String = 1;\nvar y: Number = \"s\";");

    assert_eq!(diagnostics.len(), 2);
}

// ============================================================================
// Generic containers
// ============================================================================

#[test]
fn annotated_list_literal_checks_items() {
    let (diagnostics, _, _) =
        check_source("var xs: List<Number> = [1, 2, 3]; var y: Number = xs[0];");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn list_item_outside_the_annotation_is_reported() {
    let (diagnostics, _, _) = check_source("var xs: List<Number> = [1, \"two\"];");

    assert!(
        diagnostics.iter().any(|m| m.contains("Type mismatch, incompatible types")),
        "got {diagnostics:?}"
    );
}

#[test]
fn list_index_must_be_a_number() {
    let (diagnostics, _, _) = check_source("var xs: List<Number> = [1]; var y = xs[\"zero\"];");

    assert!(
        diagnostics.iter().any(|m| m.contains("Index must be a number")),
        "got {diagnostics:?}"
    );
}

#[test]
fn annotated_map_literal_checks_keys_and_values() {
    let (diagnostics, _, _) = check_source(
        "var m: Map<String, Number> = {\"a\": 1, \"b\": 2}; var v: Number = m[\"a\"];",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn map_key_type_mismatch_is_reported() {
    let (diagnostics, _, _) =
        check_source("var m: Map<String, Number> = {\"a\": 1}; var v = m[0];");

    assert!(diagnostics.iter().any(|m| m.contains("Key type mismatch")), "got {diagnostics:?}");
}

#[test]
fn indexing_a_number_is_rejected() {
    let (diagnostics, _, _) = check_source("var n = 1; var v = n[0];");

    assert!(
        diagnostics
            .iter()
            .any(|m| m.contains("Cannot get item on something other than a list or map")),
        "got {diagnostics:?}"
    );
}

// ============================================================================
// Functions and calls
// ============================================================================

#[test]
fn call_arguments_are_checked_against_parameters() {
    let (diagnostics, _, _) =
        check_source("fun f(x: Number): Number { return x; } var y = f(\"s\");");

    assert!(diagnostics.iter().any(|m| m.contains("Type mismatch")), "got {diagnostics:?}");
}

#[test]
fn calling_a_non_functor_is_reported() {
    let (diagnostics, _, _) = check_source("var x = 1; var y = x();");

    assert!(diagnostics.iter().any(|m| m.contains("Type is not callable")), "got {diagnostics:?}");
}

#[test]
fn return_type_is_inferred_when_unannotated() {
    let (diagnostics, _, _) =
        check_source("fun f(x: Number) { return x; } var y: Number = f(1);");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn declared_return_type_is_enforced() {
    let (diagnostics, _, _) = check_source("fun f(): Number { return \"s\"; }");

    assert!(diagnostics.iter().any(|m| m.contains("Return type mismatch")), "got {diagnostics:?}");
}

#[test]
fn function_without_return_defaults_to_nil() {
    let (diagnostics, _, _) = check_source("fun f() { 1; } var x: Nil = f();");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn lambda_checks_like_a_function() {
    let (diagnostics, _, _) = check_source(
        "var double: (Number) => Number = fun (x: Number): Number => x + x;",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

// ============================================================================
// Generic unification
// ============================================================================

#[test]
fn generic_call_resolves_its_parameter() {
    let (diagnostics, _, _) =
        check_source("fun id<T>(x: T): T { return x; } var y: Number = id(3);");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn generic_result_does_not_satisfy_an_unrelated_parameter() {
    let (diagnostics, _, _) = check_source(
        "fun id<T>(x: T): T { return x; } fun wants(s: String): Nil { return nil; } \
         var r = wants(id(3));",
    );

    assert!(diagnostics.iter().any(|m| m.contains("Type mismatch")), "got {diagnostics:?}");
}

#[test]
fn generic_parameter_binds_once_and_confirms_thereafter() {
    let (diagnostics, _, _) = check_source(
        "fun pair<T>(a: T, b: T): T { return a; } var x: Number = pair(1, 2); \
         var bad = pair(1, \"two\");",
    );

    assert_eq!(diagnostics.len(), 1, "got {diagnostics:?}");
    assert!(diagnostics[0].contains("Type mismatch"));
}

#[test]
fn bounded_generic_rejects_values_outside_the_bound() {
    let (diagnostics, _, _) = check_source(
        "fun f<T extends Number>(x: T): T { return x; } var ok = f(1); var bad = f(\"s\");",
    );

    assert_eq!(diagnostics.len(), 1, "got {diagnostics:?}");
    assert!(diagnostics[0].contains("Type mismatch"));
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn class_constructor_returns_the_class_type() {
    let (diagnostics, _, _) = check_source(
        "class Point { var x: Number; fun init(x: Number) { this.x = x; } } \
         var p: Point = Point(1);",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn inherited_fields_are_visible_on_the_subclass() {
    let (diagnostics, _, _) = check_source(
        "class P { var f: Number = 1; } class C extends P { } \
         var c: C = C(); var n: Number = c.f;",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn subclass_values_flow_into_superclass_slots() {
    let (diagnostics, _, _) =
        check_source("class P { } class C extends P { } var p: P = C();");

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn methods_may_call_methods_declared_later() {
    let (diagnostics, _, _) = check_source(
        "class A { fun first(): Number { return this.second(); } \
         fun second(): Number { return 1; } }",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn missing_member_is_an_invalid_field() {
    let (diagnostics, _, _) =
        check_source("class C { } var c: C = C(); var d = c.missing;");

    assert!(diagnostics.iter().any(|m| m.contains("Invalid field")), "got {diagnostics:?}");
}

#[test]
fn setters_enforce_the_field_type() {
    let (diagnostics, _, _) = check_source(
        "class C { var n: Number; } var c: C = C(); var r = c.n = \"s\";",
    );

    assert!(
        diagnostics.iter().any(|m| m.contains("Type mismatch in setter")),
        "got {diagnostics:?}"
    );
}

#[test]
fn super_resolves_on_the_superclass() {
    let (diagnostics, _, _) = check_source(
        "class P { fun greet(): String { return \"hi\"; } } \
         class C extends P { fun greet(): String { return super.greet(); } }",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

// ============================================================================
// Interfaces
// ============================================================================

#[test]
fn class_satisfies_a_structural_interface() {
    let (diagnostics, _, _) = check_source(
        "interface I { fun f(): Number } \
         class C { fun f(): Number { return 1; } } \
         var z: I = C();",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn missing_interface_member_fails_structurally() {
    let (diagnostics, _, _) = check_source(
        "interface I { fun f(): Number } class C { } var z: I = C();",
    );

    assert!(diagnostics.iter().any(|m| m.contains("Type mismatch in var")), "got {diagnostics:?}");
}

#[test]
fn interface_parent_must_be_an_interface() {
    let (diagnostics, _, _) = check_source("class A { } interface I extends A { }");

    assert!(
        diagnostics
            .iter()
            .any(|m| m.contains("Parent type for interface may only be an interface.")),
        "got {diagnostics:?}"
    );
}

#[test]
fn interface_inherits_members_from_its_parent() {
    let (diagnostics, _, _) = check_source(
        "interface Base { fun f(): Number } interface Ext extends Base { fun g(): Number } \
         class C { fun f(): Number { return 1; } fun g(): Number { return 2; } } \
         var e: Ext = C();",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

// ============================================================================
// Unions and type declarations
// ============================================================================

#[test]
fn union_accepts_either_side() {
    let (diagnostics, _, _) = check_source(
        "type NumOrStr = Number | String; var a: NumOrStr = 1; var b: NumOrStr = \"hi\";",
    );

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn union_rejects_unrelated_types() {
    let (diagnostics, _, _) =
        check_source("type NumOrStr = Number | String; var c: NumOrStr = true;");

    assert!(diagnostics.iter().any(|m| m.contains("Type mismatch in var")), "got {diagnostics:?}");
}

// ============================================================================
// Subtyping laws
// ============================================================================

#[test]
fn subtyping_is_reflexive_with_top_and_bottom() {
    with_checker("class P { } class C extends P { }", |checker, statements| {
        checker.check(statements);
        let builtins = *checker.builtins();
        let c = checker.lookup_typedef("C").expect("C");
        let p = checker.lookup_typedef("P").expect("P");

        assert!(checker.is_subtype(c, c));
        assert!(checker.is_subtype(c, p));
        assert!(!checker.is_subtype(p, c));
        assert!(checker.is_subtype(c, builtins.any));
        assert!(checker.is_subtype(builtins.never, c));
        assert!(!checker.is_subtype(c, builtins.never));
        assert!(checker.is_subtype(builtins.number, builtins.any));
        assert!(checker.is_subtype(builtins.never, builtins.number));
    });
}

#[test]
fn application_arguments_check_left_to_right() {
    // List<Never> <= List<Any> under one-directional argument checking;
    // the reverse fails.
    with_checker("var xs: List<Never> = []; var ys: List<Any> = [];", |checker, statements| {
        checker.check(statements);
        let xs = checker.lookup_local("xs").expect("xs");
        let ys = checker.lookup_local("ys").expect("ys");

        assert!(checker.is_subtype(xs, ys));
        assert!(!checker.is_subtype(ys, xs));
    });
}

#[test]
fn functor_parameters_check_covariantly() {
    with_checker(
        "var f: (Never) => Number; var g: (Any) => Any;",
        |checker, statements| {
            checker.check(statements);
            // The annotations themselves carry the functor types.
            let f = checker.lookup_local("f").expect("f");
            let g = checker.lookup_local("g").expect("g");

            assert!(checker.is_subtype(f, g));
            assert!(!checker.is_subtype(g, f));
        },
    );
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn import_exposes_module_locals_and_caches_the_file() {
    let path = std::env::temp_dir().join(format!("sable_import_{}.sb", std::process::id()));
    std::fs::write(&path, "var answer: Number = 42;").expect("write module");

    let source = format!(
        "import \"{0}\" as M; var a: Number = M.answer; import \"{0}\" as Again;",
        path.display()
    );
    let (diagnostics, _, _) = check_source(&source);

    std::fs::remove_file(&path).ok();

    assert!(diagnostics.is_empty(), "got {diagnostics:?}");
}

#[test]
fn missing_import_reports_the_path() {
    let (diagnostics, _, _) = check_source("import \"no/such/file\" as M;");

    assert!(
        diagnostics.iter().any(|m| m.contains("Could not open file \"no/such/file\".")),
        "got {diagnostics:?}"
    );
}
