// Context-sensitive parser policies: struct literal vs. block, tuple
// indices, generic arguments, argument-list markers, forbidden constructs.

use asthra_ast::*;
use asthra_diagnostics::error_codes;
use asthra_parser::{Parser, ParserOptions};

fn parse_ok(source: &str) -> Program {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut parser = Parser::new(source, "test.asthra");
    let (program, diagnostics) = parser.parse_with_recovery();
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        diagnostics
    );
    program
}

fn first_error_code(source: &str) -> u16 {
    let mut parser = Parser::with_options(
        source,
        "test.asthra",
        ParserOptions {
            allow_incomplete_parse: false,
            max_errors: 10,
        },
    );
    parser
        .parse_program()
        .expect_err("expected a parse error")
        .code()
}

fn body_of(program: &Program, name: &str) -> Block {
    for decl in &program.decls {
        if let Decl::Function(f) = decl {
            if f.name == name {
                return f.body.clone();
            }
        }
    }
    panic!("no function `{}`", name);
}

#[test]
fn if_condition_identifier_is_not_a_struct_literal() {
    let program = parse_ok("pub fn f(none) -> void { if enabled { return (); } return (); }");
    let body = body_of(&program, "f");
    assert!(
        matches!(body.statements[0].kind, StmtKind::If(_)),
        "expected an if statement, got {:?}",
        body.statements[0].kind
    );
}

#[test]
fn registered_type_opens_struct_literal() {
    let source = r#"
        pub struct Point { x: i32, y: i32 }
        pub fn f(none) -> void {
            let p: Point = Point { x: 1, y: 2 };
            return ();
        }
    "#;
    let program = parse_ok(source);
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert!(matches!(
        value.kind,
        ExprKind::StructLiteral { ref name, .. } if name == "Point"
    ));
}

#[test]
fn empty_braces_open_struct_literal() {
    // Rule (b): lookahead past `{` is `}` — even for unregistered names.
    let program = parse_ok("pub fn f(none) -> void { let e: Marker = Marker { }; return (); }");
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert!(matches!(value.kind, ExprKind::StructLiteral { .. }));
}

#[test]
fn tuple_index_chain_expands_dot_float() {
    // `t.0.1` reaches the parser as DOT FLOAT(0.1) and must expand into
    // two chained accesses, identical to explicit DOT 0 DOT 1.
    let program = parse_ok("pub fn f(none) -> void { let a: i32 = t.0.1; return (); }");
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    let ExprKind::FieldAccess { object, field } = &value.kind else {
        panic!("expected outer field access, got {:?}", value.kind);
    };
    assert_eq!(field, "1");
    let ExprKind::FieldAccess { object, field } = &object.kind else {
        panic!("expected inner field access");
    };
    assert_eq!(field, "0");
    assert!(matches!(object.kind, ExprKind::Ident(ref n) if n == "t"));
}

#[test]
fn single_tuple_index() {
    let program = parse_ok("pub fn f(none) -> void { let a: i32 = t.0; return (); }");
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert!(matches!(
        &value.kind,
        ExprKind::FieldAccess { field, .. } if field == "0"
    ));
}

#[test]
fn generic_struct_literal_with_type_args() {
    let source = r#"
        pub struct Vec<T> { items: []T }
        pub fn f(none) -> void {
            let v: Vec<i32> = Vec<i32> { items: [] };
            return ();
        }
    "#;
    let program = parse_ok(source);
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    let ExprKind::StructLiteral { type_args, .. } = &value.kind else {
        panic!("expected struct literal, got {:?}", value.kind);
    };
    assert_eq!(type_args.len(), 1);
}

#[test]
fn nested_generics_split_shift_token() {
    // `Vec<Vec<i32>>` ends in a `>>` token the parser must split.
    let source = r#"
        pub struct Vec<T> { items: []T }
        pub fn f(v: Vec<Vec<i32>>) -> void { return (); }
    "#;
    parse_ok(source);
}

#[test]
fn comparison_is_not_type_arguments() {
    let program = parse_ok("pub fn f(none) -> bool { return a < b; }");
    let body = body_of(&program, "f");
    let StmtKind::Return(value) = &body.statements[0].kind else {
        panic!("expected return");
    };
    assert!(matches!(
        value.kind,
        ExprKind::Binary { op: BinaryOp::Lt, .. }
    ));
}

#[test]
fn empty_argument_lists() {
    // `f(void)` gets the dedicated migration error
    assert_eq!(
        first_error_code("pub fn f(none) -> void { g(void); return (); }"),
        error_codes::VOID_ARGUMENT_LIST
    );
    // the spelled-out marker and the bare form both parse
    let program = parse_ok("pub fn f(none) -> void { g(none); h(); return (); }");
    let body = body_of(&program, "f");
    for stmt in &body.statements[..2] {
        let StmtKind::Expression(expr) = &stmt.kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert!(args.is_empty());
    }
}

#[test]
fn empty_parameter_lists_require_none() {
    assert_eq!(
        first_error_code("pub fn f() -> void { return (); }"),
        error_codes::MISSING_TOKEN
    );
}

#[test]
fn method_calls_may_use_bare_parens() {
    parse_ok("pub fn f(none) -> void { let n: u64 = v.len(); return (); }");
}

#[test]
fn trailing_comma_rejected_in_match_arms() {
    let source = r#"
        pub fn f(none) -> void {
            match x {
                1 => log("one"),
                _ => log("other"),
            }
            return ();
        }
    "#;
    assert_eq!(first_error_code(source), error_codes::TRAILING_COMMA);
}

#[test]
fn trailing_comma_rejected_in_struct_patterns() {
    let source = r#"
        pub struct Point { x: i32, y: i32 }
        pub fn f(none) -> void {
            match p {
                Point { x: a, y: b, } => log("hit")
            }
            return ();
        }
    "#;
    assert_eq!(first_error_code(source), error_codes::TRAILING_COMMA);
}

#[test]
fn unqualified_enum_pattern_gets_fix_it() {
    let source = r#"
        pub fn f(none) -> void {
            match x {
                Some(v) => v,
                _ => 0
            }
            return ();
        }
    "#;
    let mut parser = Parser::new(source, "test.asthra");
    let (_, diagnostics) = parser.parse_with_recovery();
    let diag = diagnostics
        .iter()
        .find(|d| d.code == error_codes::UNQUALIFIED_ENUM_PATTERN)
        .expect("expected the unqualified-pattern error");
    assert!(diag.suggestion.is_some());
}

#[test]
fn postfix_path_is_rejected() {
    assert_eq!(
        first_error_code("pub fn f(none) -> void { g(none)::h(); return (); }"),
        error_codes::POSTFIX_PATH
    );
}

#[test]
fn let_requires_type_annotation() {
    assert_eq!(
        first_error_code("pub fn f(none) -> i32 { let x = 1; return x; }"),
        error_codes::MISSING_TYPE_ANNOTATION
    );
}

#[test]
fn reserved_keyword_as_variable_name() {
    assert_eq!(
        first_error_code("pub fn f(none) -> void { let match: i32 = 1; return (); }"),
        error_codes::RESERVED_KEYWORD
    );
}

#[test]
fn return_requires_expression() {
    assert_eq!(
        first_error_code("pub fn f(none) -> void { return; }"),
        error_codes::MISSING_TOKEN
    );
}

#[test]
fn while_is_rejected_with_hint() {
    assert_eq!(
        first_error_code("pub fn f(none) -> void { while x { } return (); }"),
        error_codes::UNSUPPORTED_CONSTRUCT
    );
}

#[test]
fn spawn_forms_parse() {
    let source = r#"
        pub fn f(none) -> void {
            spawn worker(none);
            spawn_with_handle h = worker(none);
            let r: i32 = await h;
            return ();
        }
    "#;
    let program = parse_ok(source);
    let body = body_of(&program, "f");
    assert!(matches!(body.statements[0].kind, StmtKind::Spawn { .. }));
    assert!(matches!(
        body.statements[1].kind,
        StmtKind::SpawnWithHandle { .. }
    ));
}

#[test]
fn slice_expressions_parse() {
    let program = parse_ok(
        "pub fn f(none) -> void { let s: []i32 = a[1:2]; let t: []i32 = a[:]; return (); }",
    );
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert!(matches!(value.kind, ExprKind::Slice { .. }));
}

#[test]
fn ownership_tags_and_annotations_parse() {
    let source = r#"
        #[packed]
        pub struct Buffer { data: *mut u8 }
        pub fn f(none) -> void {
            let p: *mut u8 #[transfer_full] = q;
            return ();
        }
        extern "C" {
            #[transfer_none]
            fn malloc(size: usize) -> *mut u8;
        }
    "#;
    let program = parse_ok(source);
    let Decl::Struct(s) = &program.decls[0] else {
        panic!("expected struct");
    };
    assert_eq!(s.annotations[0].name, "packed");

    let body = body_of(&program, "f");
    let StmtKind::Let { ownership, .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert_eq!(ownership, &vec![OwnershipTag::TransferFull]);
}

#[test]
fn package_and_imports_parse() {
    let source = r#"
        package main;
        import "stdlib/io" as io;
        import "stdlib/string";
        pub fn main(none) -> void { return (); }
    "#;
    let program = parse_ok(source);
    assert_eq!(program.package.as_deref(), Some("main"));
    assert_eq!(program.imports.len(), 2);
    assert_eq!(program.imports[0].alias.as_deref(), Some("io"));
}

#[test]
fn impl_methods_require_visibility() {
    let source = r#"
        pub struct S { v: i32 }
        impl S {
            fn m(self) -> i32 { return 0; }
        }
    "#;
    assert_eq!(first_error_code(source), error_codes::MISSING_TOKEN);
}

#[test]
fn enum_constructor_expression() {
    let source = r#"
        pub enum Color { Red, Rgb(i32) }
        pub fn f(none) -> void {
            let c: Color = Color.Red;
            let d: Color = Color.Rgb(7);
            return ();
        }
    "#;
    let program = parse_ok(source);
    let body = body_of(&program, "f");
    let StmtKind::Let { value: Some(value), .. } = &body.statements[0].kind else {
        panic!("expected let");
    };
    assert!(matches!(
        &value.kind,
        ExprKind::EnumConstructor { enum_name, variant, payload: None }
            if enum_name == "Color" && variant == "Red"
    ));
}
