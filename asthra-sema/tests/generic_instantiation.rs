// Generic struct/enum instantiation: argument binding, substitution
// through fields and methods, and instance equality.

use asthra_ast::PrimitiveType;
use asthra_diagnostics::{error_codes, Severity};
use asthra_sema::{analyze_source, AnalyzedProgram, AnalyzerOptions, TypeKind};

fn analyze(source: &str) -> AnalyzedProgram {
    let _ = env_logger::builder().is_test(true).try_init();
    analyze_source(source, "generics.asthra", AnalyzerOptions::default()).expect("pipeline failure")
}

fn has_error(analyzed: &AnalyzedProgram, code: u16) -> bool {
    analyzed
        .diagnostics
        .iter()
        .any(|d| d.code == code && d.severity == Severity::Error)
}

#[test]
fn field_types_substitute_through_instances() {
    let source = r#"
        pub struct Pair<T> { first: T, second: T }
        pub fn f(p: Pair<i32>) -> i32 {
            let a: i32 = p.first;
            return a;
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);
}

#[test]
fn wrong_field_type_through_instance_is_rejected() {
    let source = r#"
        pub struct Pair<T> { first: T, second: T }
        pub fn f(p: Pair<string>) -> i32 {
            let a: i32 = p.first;
            return a;
        }
    "#;
    let analyzed = analyze(source);
    assert!(has_error(&analyzed, error_codes::TYPE_MISMATCH));
}

#[test]
fn type_argument_count_is_checked() {
    let source = r#"
        pub struct Pair<T> { first: T, second: T }
        pub fn f(none) -> void {
            let p: Pair<i32, i32> = Pair<i32, i32> { first: 1, second: 2 };
            return ();
        }
    "#;
    let analyzed = analyze(source);
    assert!(has_error(&analyzed, error_codes::TYPE_MISMATCH));
}

#[test]
fn bare_generic_name_needs_arguments() {
    let source = r#"
        pub struct Pair<T> { first: T, second: T }
        pub fn f(p: Pair) -> void { return (); }
    "#;
    let analyzed = analyze(source);
    assert!(has_error(&analyzed, error_codes::TYPE_MISMATCH));
}

#[test]
fn instances_with_equal_arguments_are_one_descriptor() {
    let source = r#"
        pub struct Holder<T> { value: T }
        pub fn f(a: Holder<i32>, b: Holder<i32>) -> void {
            let c: Holder<i32> = a;
            let d: Holder<i32> = b;
            return ();
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);
}

#[test]
fn generic_enum_needs_context_for_construction() {
    let source = r#"
        pub enum Wrap<T> { Empty, Full(T) }
        pub fn f(none) -> void {
            let w: Wrap<i32> = Wrap.Full(3);
            return ();
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);

    // Without an annotated target the arguments cannot be inferred
    let source = r#"
        pub enum Wrap<T> { Empty, Full(T) }
        pub fn g(w: Wrap<i32>) -> void { return (); }
        pub fn f(none) -> void {
            g(Wrap.Full(3));
            return ();
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);
}

#[test]
fn generic_enum_patterns_substitute_payloads() {
    let source = r#"
        pub enum Wrap<T> { Empty, Full(T) }
        pub fn f(w: Wrap<i32>) -> i32 {
            match w {
                Wrap.Full(v) => v,
                Wrap.Empty => 0
            }
            return 0;
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);
}

#[test]
fn struct_pattern_type_args_must_match_instance() {
    let source = r#"
        pub struct Pair<T> { first: T, second: T }
        pub fn f(p: Pair<i32>) -> i32 {
            match p {
                Pair<string> { first: a, .. } => 0,
                _ => 1
            }
            return 0;
        }
    "#;
    let analyzed = analyze(source);
    assert!(has_error(&analyzed, error_codes::INVALID_PATTERN));
}

#[test]
fn methods_resolve_on_instances_of_generic_structs() {
    let source = r#"
        pub struct Stack<T> { items: []T }
        impl Stack {
            pub fn depth(self) -> usize { return 0; }
        }
        pub fn f(s: Stack<f64>) -> usize {
            let d: usize = s.depth();
            return d;
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);
}

#[test]
fn task_handles_carry_their_result_type() {
    let source = r#"
        pub fn compute(none) -> f64 { return 1.0; }
        pub fn f(none) -> f64 {
            spawn_with_handle h = compute(none);
            let out: f64 = await h;
            return out;
        }
    "#;
    let analyzed = analyze(source);
    assert!(analyzed.success(), "{:#?}", analyzed.diagnostics);

    // The handle's NodeId-typed uses are TaskHandle<f64>
    let found = analyzed.expr_types.values().any(|&ty| {
        matches!(
            analyzed.types.kind(ty),
            TypeKind::TaskHandle { result }
                if analyzed.types.is_primitive(*result, PrimitiveType::F64)
        )
    });
    assert!(found, "expected a TaskHandle<f64> in the typed AST");
}
