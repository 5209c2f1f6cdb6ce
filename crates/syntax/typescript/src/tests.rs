//! Tests for parsing, binding and type queries.

use super::*;

fn parse_ok(source: &str) -> SourceFile {
    parse(source, "test.ts").expect("parse failed")
}

fn first_expression(file: &SourceFile) -> &Expression {
    match &file.statements[0].kind {
        StatementKind::Expression(expression) => expression,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

/// Initializer of the last variable declared in the file.
fn last_initializer(file: &SourceFile) -> &Expression {
    file.statements
        .iter()
        .rev()
        .find_map(|statement| match &statement.kind {
            StatementKind::Variable(variable) => variable.declarations[0].initializer.as_ref(),
            _ => None,
        })
        .expect("no initializer")
}

#[test]
fn test_prelude_parses() {
    let prelude = prelude().expect("prelude failed to parse");
    assert!(prelude.statements.len() > 20);
    assert!(find_annotation(&prelude.annotations, AnnotationKind::NoSelfInFile).is_some());
}

#[test]
fn test_number_literals() {
    let file = parse_ok("0x1F; 0b101; 0o17; 1_000; 1.5e3;");
    let values: Vec<f64> = file
        .statements
        .iter()
        .map(|statement| match &statement.kind {
            StatementKind::Expression(Expression {
                kind: ExpressionKind::Number(value),
                ..
            }) => *value,
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![31.0, 5.0, 15.0, 1000.0, 1500.0]);
}

#[test]
fn test_string_escapes() {
    let file = parse_ok(r#""a\nb\tA\x42";"#);
    assert_eq!(
        first_expression(&file).kind,
        ExpressionKind::String("a\nb\tAB".into())
    );
}

#[test]
fn test_syntax_error_position() {
    let err = parse("let x = ;\n", "bad.ts").unwrap_err();
    match err {
        ParseError::Syntax { line, .. } => assert_eq!(line, 1),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_template_literal() {
    let file = parse_ok("`a${1}b${2}c`;");
    match &first_expression(&file).kind {
        ExpressionKind::Template(template) => {
            assert_eq!(template.quasis, vec!["a", "b", "c"]);
            assert_eq!(template.expressions.len(), 2);
        }
        other => panic!("expected template, got {:?}", other),
    }
}

#[test]
fn test_optional_chain() {
    let file = parse_ok("a?.b;");
    match &first_expression(&file).kind {
        ExpressionKind::PropertyAccess(access) => {
            assert!(access.optional);
            assert_eq!(access.name.name, "b");
        }
        other => panic!("expected property access, got {:?}", other),
    }
}

#[test]
fn test_compound_assignment() {
    let file = parse_ok("x ??= 1;");
    match &first_expression(&file).kind {
        ExpressionKind::CompoundAssignment(assignment) => {
            assert_eq!(assignment.operator, CompoundOperator::Coalesce);
        }
        other => panic!("expected compound assignment, got {:?}", other),
    }
}

#[test]
fn test_array_holes() {
    let file = parse_ok("[1, , 3];");
    match &first_expression(&file).kind {
        ExpressionKind::Array(elements) => {
            assert_eq!(elements.len(), 3);
            assert_eq!(elements[1].kind, ExpressionKind::Omitted);
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_module_detection() {
    assert!(!parse_ok("const x = 1;").is_module);
    assert!(parse_ok("export const x = 1;").is_module);
    assert!(parse_ok("import { a } from \"./a\";").is_module);
}

#[test]
fn test_destructuring_bound_names() {
    let file = parse_ok("const { a, b: [c, ...d], ...e } = value;");
    let StatementKind::Variable(variable) = &file.statements[0].kind else {
        panic!("expected variable statement");
    };
    let names: Vec<&str> = variable.declarations[0]
        .name
        .bound_names()
        .into_iter()
        .filter_map(Pattern::as_identifier)
        .collect();
    assert_eq!(names, vec!["a", "c", "d", "e"]);
}

#[test]
fn test_annotations() {
    let file = parse_ok("/** @noSelf */\ndeclare function f(x: number): void;");
    let StatementKind::Function(function) = &file.statements[0].kind else {
        panic!("expected function declaration");
    };
    assert!(find_annotation(&function.annotations, AnnotationKind::NoSelf).is_some());
    assert!(function.modifiers.declare);
}

#[test]
fn test_class_members() {
    let file = parse_ok(
        "class A extends B {\n  x = 1;\n  static y: number;\n  constructor(private z: number) { super(); }\n  get v() { return 1; }\n  m() {}\n}",
    );
    let StatementKind::Class(class) = &file.statements[0].kind else {
        panic!("expected class");
    };
    assert!(class.extends.is_some());
    assert_eq!(class.members.len(), 5);
    let constructor = class.constructor().expect("constructor");
    assert!(constructor.params[0].is_property);
}

#[test]
fn test_references_resolve_to_declaration() {
    let file = parse_ok("let x = 1;\nfunction f() { return x; }\n{ let x = 2; x; }");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let StatementKind::Variable(variable) = &file.statements[0].kind else {
        panic!("expected variable");
    };
    let outer = checker
        .symbol_of(variable.declarations[0].name.id)
        .expect("outer symbol");
    assert_eq!(checker.references(outer).len(), 1);
    assert!(!checker.is_assigned(outer));
}

#[test]
fn test_prelude_globals_resolve() {
    let file = parse_ok("print(string.sub(\"abc\", 1, 2));");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let print = checker.global("print").expect("print");
    assert_eq!(checker.symbol(print).origin, Origin::Prelude);
    let string = checker.global("string").expect("string");
    assert!(checker.namespace_member(string, "sub").is_some());
}

#[test]
fn test_array_and_string_types() {
    let file = parse_ok("const xs = [1, 2, 3];\nconst s = \"a\" + 1;\nconst n = xs.length;");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let types: Vec<Type> = file
        .statements
        .iter()
        .map(|statement| match &statement.kind {
            StatementKind::Variable(variable) => {
                checker.type_of(variable.declarations[0].initializer.as_ref().expect("init"))
            }
            _ => Type::Any,
        })
        .collect();
    assert!(types[0].is_array());
    assert!(types[1].is_string());
    assert!(types[2].is_number());
}

#[test]
fn test_annotated_parameter_type() {
    let file = parse_ok("function f(xs: string[]) { return xs; }\nconst r = f([]);");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    assert!(checker.type_of(last_initializer(&file)).is_array());
}

#[test]
fn test_class_instance_type() {
    let file = parse_ok("class Point { x = 1; }\nconst p = new Point();\nconst x = p.x;");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    assert!(checker.type_of(last_initializer(&file)).is_number());
}

#[test]
fn test_function_context_defaults() {
    let file = parse_ok(
        "function f(this: void) {}\nfunction g() {}\n/** @noSelf */\nfunction h() {}",
    );
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let contexts: Vec<ContextType> = file
        .statements
        .iter()
        .filter_map(|statement| match &statement.kind {
            StatementKind::Function(function) => Some(checker.function_context(&function.function)),
            _ => None,
        })
        .collect();
    assert_eq!(
        contexts,
        vec![ContextType::Void, ContextType::NonVoid, ContextType::Void]
    );
}

#[test]
fn test_no_implicit_self_option() {
    let file = parse_ok("function g() {}");
    let options = CheckerOptions {
        no_implicit_self: true,
    };
    let checker = Checker::new(&file, options).expect("checker");
    let StatementKind::Function(function) = &file.statements[0].kind else {
        panic!("expected function");
    };
    assert_eq!(checker.function_context(&function.function), ContextType::Void);
}

#[test]
fn test_callback_takes_context_of_parameter() {
    let file = parse_ok(
        "declare function run(cb: (this: void, x: number) => void): void;\nrun(x => {});",
    );
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let ExpressionKind::Call(call) = &first_expression_at(&file, 1).kind else {
        panic!("expected call");
    };
    let ExpressionKind::Function(callback) = &call.arguments[0].kind else {
        panic!("expected arrow");
    };
    assert_eq!(checker.function_context(callback), ContextType::Void);
}

fn first_expression_at(file: &SourceFile, index: usize) -> &Expression {
    match &file.statements[index].kind {
        StatementKind::Expression(expression) => expression,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_enum_values_auto_increment() {
    let file = parse_ok("enum E { A, B = 5, C, D = \"d\", F = B * 2 }");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let StatementKind::Enum(declaration) = &file.statements[0].kind else {
        panic!("expected enum");
    };
    let values = checker.enum_values(declaration);
    assert_eq!(values[0].1, Some(EnumValue::Number(0.0)));
    assert_eq!(values[1].1, Some(EnumValue::Number(5.0)));
    assert_eq!(values[2].1, Some(EnumValue::Number(6.0)));
    assert_eq!(values[3].1, Some(EnumValue::String("d".into())));
    assert_eq!(values[4].1, Some(EnumValue::Number(10.0)));
}

#[test]
fn test_multi_return_signature() {
    let file = parse_ok(
        "function f(): LuaMultiReturn<[number, string]> { return $multi(1, \"a\"); }\nconst r = f();",
    );
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let ExpressionKind::Call(call) = &last_initializer(&file).kind else {
        panic!("expected call");
    };
    assert!(checker.returns_multi(call));
}

#[test]
fn test_forwarding_function_is_inferred_multi() {
    let file = parse_ok(
        "function m(): LuaMultiReturn<[number, number]> { return $multi(1, 2); }
        function f() { return m(); }
        function g(): number[] { return m(); }
        function h() { return f(); }
        const r = h();",
    );
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let multi: Vec<bool> = file.statements[..4]
        .iter()
        .map(|statement| match &statement.kind {
            StatementKind::Function(declaration) => checker.is_multi_return_function(&declaration.function),
            other => panic!("expected function, got {:?}", other),
        })
        .collect();
    assert_eq!(multi, vec![true, true, false, true]);
    let ExpressionKind::Call(call) = &last_initializer(&file).kind else {
        panic!("expected call");
    };
    assert!(checker.returns_multi(call));
}

#[test]
fn test_accessor_lookup_walks_bases() {
    let file = parse_ok("class A { get v() { return 1; } }\nclass B extends A {}");
    let checker = Checker::new(&file, CheckerOptions::default()).expect("checker");
    let StatementKind::Class(class) = &file.statements[1].kind else {
        panic!("expected class");
    };
    let symbol = checker.class_symbol(class).expect("class symbol");
    assert!(checker.has_accessor(symbol, "v", false));
    assert!(!checker.has_accessor(symbol, "w", false));
}

#[test]
fn test_union_flattening() {
    let union = Type::union(vec![
        Type::Number,
        Type::union(vec![Type::String, Type::Number]),
        Type::Undefined,
    ]);
    assert_eq!(
        union,
        Type::Union(vec![Type::Number, Type::String, Type::Undefined])
    );
    assert_eq!(union.non_nullable(), Type::Union(vec![Type::Number, Type::String]));
}

#[test]
fn test_can_be_falsy() {
    assert!(!Type::Number.can_be_falsy());
    assert!(!Type::String.can_be_falsy());
    assert!(Type::Boolean.can_be_falsy());
    assert!(Type::union(vec![Type::Number, Type::Undefined]).can_be_falsy());
}
