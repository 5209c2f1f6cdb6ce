//! Tests for Lua printing, source maps and the traceback table.

use super::*;
use rhizome_tslua_ast::{
    BinaryOperator, ElseBranch, Expression, Identifier, NodeFlags, SourceRange, Statement,
    TableField, UnaryOperator,
};

fn bare_options() -> PrintOptions {
    PrintOptions {
        no_header: true,
        ..PrintOptions::default()
    }
}

fn print(statements: Vec<Statement>) -> String {
    print_lua(&Block::new(statements), "test.ts", &BTreeSet::new(), &bare_options())
        .expect("print failed")
        .code
}

fn print_expression(expression: Expression) -> String {
    let mut printer = LuaPrinter::new();
    printer.print_expression(&expression);
    printer.finish().0
}

fn id(name: &str) -> Expression {
    Expression::identifier(name)
}

fn num(value: f64) -> Expression {
    Expression::number(value)
}

fn range(line: u32, column: u32) -> Option<SourceRange> {
    Some(SourceRange {
        start: 0,
        end: 1,
        line,
        column,
    })
}

#[test]
fn test_local_and_assignment() {
    let code = print(vec![
        Statement::local_one(Identifier::new("x"), Some(num(1.0))),
        Statement::local(vec![Identifier::new("a"), Identifier::new("b")], Vec::new()),
        Statement::assign(vec![id("a"), id("b")], vec![id("b"), id("a")]),
    ]);
    assert_eq!(code, "local x = 1;\nlocal a, b;\na, b = b, a;\n");
}

#[test]
fn test_statements_after_return_are_dropped() {
    let code = print(vec![
        Statement::ret(vec![num(3.0)]),
        Statement::local_one(Identifier::new("unused"), Some(num(8.0))),
    ]);
    assert_eq!(code, "return 3;\n");
    assert!(!code.contains("unused"));
}

#[test]
fn test_statements_after_break_are_dropped() {
    let body = Block::new(vec![
        Statement::break_loop(),
        Statement::expression(Expression::call(id("f"), Vec::new())),
    ]);
    let code = print(vec![Statement::while_loop(Expression::boolean(true), body)]);
    assert_eq!(code, "while true do\n    break;\nend\n");
}

#[test]
fn test_nested_indentation() {
    let inner = Statement::if_then(
        id("b"),
        Block::new(vec![Statement::expression(Expression::call(id("f"), Vec::new()))]),
        None,
    );
    let code = print(vec![Statement::do_block(vec![inner])]);
    assert_eq!(code, "do\n    if b then\n        f();\n    end\nend\n");
}

#[test]
fn test_if_elseif_else() {
    let call = |name: &str| Block::new(vec![Statement::expression(Expression::call(id(name), Vec::new()))]);
    let statement = Statement::if_then(
        id("a"),
        call("f"),
        Some(ElseBranch::ElseIf(Box::new(rhizome_tslua_ast::IfStatement {
            condition: id("b"),
            then_block: call("g"),
            else_branch: Some(ElseBranch::Block(call("h"))),
        }))),
    );
    assert_eq!(
        print(vec![statement]),
        "if a then\n    f();\nelseif b then\n    g();\nelse\n    h();\nend\n"
    );
}

#[test]
fn test_loops() {
    let body = Block::new(vec![Statement::expression(Expression::call(id("print"), vec![id("k")]))]);
    let code = print(vec![
        Statement::for_in(
            vec![Identifier::new("k"), Identifier::new("v")],
            vec![Expression::call(id("pairs"), vec![id("t")])],
            body.clone(),
        ),
        Statement::repeat(body, id("done")),
    ]);
    assert_eq!(
        code,
        "for k, v in pairs(t) do\n    print(k);\nend\nrepeat\n    print(k);\nuntil done\n"
    );
}

#[test]
fn test_goto_and_label() {
    let code = print(vec![Statement::goto("__continue1"), Statement::label("__continue1")]);
    assert_eq!(code, "goto __continue1;\n::__continue1::\n");
}

#[test]
fn test_numbers() {
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(-42.0), "-42");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(f64::NAN), "(0/0)");
    assert_eq!(format_number(f64::INFINITY), "math.huge");
    assert_eq!(format_number(f64::NEG_INFINITY), "-math.huge");
    assert_eq!(format_number(1e21), "1e21");
}

#[test]
fn test_string_escapes() {
    assert_eq!(escape_string("plain"), "\"plain\"");
    assert_eq!(
        escape_string("a\\b'c\"d\ne\rf\tg\0"),
        "\"a\\\\b\\'c\\\"d\\ne\\rf\\tg\\0\""
    );
    assert_eq!(escape_string("\u{b}\u{8}\u{c}"), "\"\\v\\b\\f\"");
    // A NUL before a digit must not read as a longer escape.
    assert_eq!(escape_string("\u{0}1"), "\"\\0001\"");
    assert_eq!(escape_string("\u{1}"), "\"\\001\"");
}

#[test]
fn test_binary_precedence() {
    let sum = Expression::binary(id("a"), BinaryOperator::Add, id("b"));
    assert_eq!(
        print_expression(Expression::binary(sum.clone(), BinaryOperator::Mul, id("c"))),
        "(a + b) * c"
    );
    assert_eq!(
        print_expression(Expression::binary(id("c"), BinaryOperator::Add, sum.clone())),
        "c + (a + b)"
    );
    assert_eq!(
        print_expression(Expression::binary(sum, BinaryOperator::Sub, id("c"))),
        "a + b - c"
    );
    let concat = Expression::binary(id("b"), BinaryOperator::Concat, id("c"));
    assert_eq!(
        print_expression(Expression::binary(id("a"), BinaryOperator::Concat, concat)),
        "a .. b .. c"
    );
    let power = Expression::binary(id("a"), BinaryOperator::Pow, id("b"));
    assert_eq!(
        print_expression(Expression::binary(power, BinaryOperator::Pow, id("c"))),
        "(a ^ b) ^ c"
    );
    let or = Expression::binary(id("a"), BinaryOperator::Or, id("b"));
    assert_eq!(
        print_expression(Expression::binary(or, BinaryOperator::And, id("c"))),
        "(a or b) and c"
    );
}

#[test]
fn test_unary_operands() {
    let comparison = Expression::binary(id("a"), BinaryOperator::Eq, id("b"));
    assert_eq!(
        print_expression(Expression::unary(UnaryOperator::Not, comparison)),
        "not (a == b)"
    );
    assert_eq!(
        print_expression(Expression::unary(UnaryOperator::Negate, num(-1.0))),
        "-(-1)"
    );
    let negated = Expression::unary(UnaryOperator::Negate, id("x"));
    assert_eq!(
        print_expression(Expression::unary(UnaryOperator::Negate, negated.clone())),
        "-(-x)"
    );
    assert_eq!(
        print_expression(Expression::binary(negated, BinaryOperator::Pow, num(2.0))),
        "(-x) ^ 2"
    );
    assert_eq!(print_expression(Expression::unary(UnaryOperator::Length, id("t"))), "#t");
}

#[test]
fn test_table_index_forms() {
    assert_eq!(print_expression(Expression::field(id("t"), "name")), "t.name");
    assert_eq!(print_expression(Expression::field(id("t"), "end")), "t[\"end\"]");
    assert_eq!(print_expression(Expression::field(id("t"), "a-b")), "t[\"a-b\"]");
    assert_eq!(print_expression(Expression::table_index(id("t"), num(1.0))), "t[1]");
    assert_eq!(print_expression(Expression::path("string.sub")), "string.sub");
}

#[test]
fn test_prefix_expressions_are_parenthesized() {
    let call = Expression::method_call(Expression::string("x"), "rep", vec![num(3.0)]);
    assert_eq!(print_expression(call), "(\"x\"):rep(3)");
    let index = Expression::field(Expression::table(Vec::new()), "a");
    assert_eq!(print_expression(index), "({}).a");
    let callee = Expression::binary(id("f"), BinaryOperator::Or, id("g"));
    assert_eq!(print_expression(Expression::call(callee, vec![id("x")])), "(f or g)(x)");
}

#[test]
fn test_tables() {
    let table = Expression::table(vec![
        TableField::positional(num(1.0)),
        TableField::keyed(Expression::string("a"), num(2.0)),
        TableField::keyed(Expression::string("not valid"), num(3.0)),
        TableField::keyed(num(5.0), Expression::boolean(true)),
    ]);
    assert_eq!(
        print_expression(table),
        "{1, a = 2, [\"not valid\"] = 3, [5] = true}"
    );
}

#[test]
fn test_function_declarations() {
    let body = Block::new(vec![Statement::ret(vec![id("x")])]);
    let local = Statement::local_one(
        Identifier::new("f"),
        Some(Expression::function(
            vec![Identifier::new("x")],
            false,
            body.clone(),
            NodeFlags::DECLARATION,
        )),
    );
    let method = Statement::assign_one(
        Expression::path("C.prototype.get"),
        Expression::function(
            vec![Identifier::new("self"), Identifier::new("x")],
            true,
            body.clone(),
            NodeFlags::DECLARATION,
        ),
    );
    let plain = Statement::assign_one(
        Expression::table_index(id("t"), num(1.0)),
        Expression::function(Vec::new(), false, body, NodeFlags::DECLARATION),
    );
    assert_eq!(
        print(vec![local, method, plain]),
        "local function f(x)\n    return x;\nend\n\
         function C.prototype.get(self, x, ...)\n    return x;\nend\n\
         t[1] = function()\n    return x;\nend;\n"
    );
}

#[test]
fn test_inline_function() {
    let function = Expression::function(
        vec![Identifier::new("x")],
        false,
        Block::new(vec![Statement::ret(vec![Expression::binary(
            id("x"),
            BinaryOperator::Mul,
            num(2.0),
        )])]),
        NodeFlags::INLINE,
    );
    assert_eq!(print_expression(function), "function(x) return x * 2 end");
}

#[test]
fn test_header_and_require_import() {
    let features: BTreeSet<_> = [LuaLibFeature::ArrayMap].into_iter().collect();
    let output = print_lua(&Block::default(), "main.ts", &features, &PrintOptions::default())
        .expect("print failed");
    assert_eq!(output.code, "--[[ Generated with tslua ]]\nrequire(\"lualib_bundle\");\n");

    let unused = print_lua(&Block::default(), "main.ts", &BTreeSet::new(), &PrintOptions::default())
        .expect("print failed");
    assert!(!unused.code.contains("require"));

    let always = PrintOptions {
        lua_lib_import: LuaLibImportKind::Always,
        ..bare_options()
    };
    let output = print_lua(&Block::default(), "main.ts", &BTreeSet::new(), &always).expect("print failed");
    assert_eq!(output.code, "require(\"lualib_bundle\");\n");
}

#[test]
fn test_inline_import() {
    let features: BTreeSet<_> = [LuaLibFeature::ArrayFlat].into_iter().collect();
    let options = PrintOptions {
        lua_lib_import: LuaLibImportKind::Inline,
        ..bare_options()
    };
    let output = print_lua(&Block::default(), "main.ts", &features, &options).expect("print failed");
    assert!(output.code.starts_with("-- Lua Library inline imports\n"));
    assert!(output.code.contains("function __TS__ArrayFlat"));
    assert!(output.code.contains("function __TS__ArrayIsArray"));
    assert!(!output.code.contains("require"));

    let none = PrintOptions {
        lua_lib_import: LuaLibImportKind::None,
        ..bare_options()
    };
    let output = print_lua(&Block::default(), "main.ts", &features, &none).expect("print failed");
    assert_eq!(output.code, "");
}

#[test]
fn test_vlq() {
    assert_eq!(vlq::encode(0), "A");
    assert_eq!(vlq::encode(1), "C");
    assert_eq!(vlq::encode(-1), "D");
    assert_eq!(vlq::encode(16), "gB");
    for value in [-100, -1, 0, 7, 1000] {
        let encoded = vlq::encode(value);
        assert_eq!(vlq::decode(&encoded), Some((value, encoded.len())));
    }
}

#[test]
fn test_base64() {
    assert_eq!(source_map::base64_encode(b"Man"), "TWFu");
    assert_eq!(source_map::base64_encode(b"Ma"), "TWE=");
    assert_eq!(source_map::base64_encode(b"M"), "TQ==");
}

#[test]
fn test_source_map_shape() {
    let statements = vec![
        Statement::local_one(
            Identifier::new("x").with_range(range(0, 6)),
            Some(num(1.0).with_range(range(0, 10))),
        )
        .with_range(range(0, 0)),
        Statement::expression(Expression::call(id("print"), vec![id("x")]).with_range(range(2, 4))),
    ];
    let options = PrintOptions {
        source_map: true,
        ..bare_options()
    };
    let output = print_lua(&Block::new(statements), "src/main.ts", &BTreeSet::new(), &options)
        .expect("print failed");
    let map: serde_json::Value =
        serde_json::from_str(output.source_map.as_deref().expect("no source map")).expect("invalid json");
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "src/main.lua");
    assert_eq!(map["sources"], serde_json::json!(["src/main.ts"]));
    assert_eq!(map["names"], serde_json::json!(["x"]));
    // Line one maps `local`, `x` and `1`; line two maps the call.
    assert_eq!(map["mappings"], "AAAA,MAAMA,IAAI;AAEN");

    assert_eq!(output.mappings[1].generated_column, 6);
    assert_eq!(output.mappings[1].name.as_deref(), Some("x"));
}

#[test]
fn test_inline_source_map() {
    let options = PrintOptions {
        inline_source_map: true,
        ..bare_options()
    };
    let statement = Statement::ret(Vec::new()).with_range(range(0, 0));
    let output = print_lua(&Block::new(vec![statement]), "a.ts", &BTreeSet::new(), &options)
        .expect("print failed");
    assert!(output.source_map.is_none());
    assert!(
        output
            .code
            .contains("\n--# sourceMappingURL=data:application/json;base64,eyJ2ZXJzaW9uIjoz")
    );
}

#[test]
fn test_traceback_table() {
    let mapping = |generated_line, original_line| Mapping {
        generated_line,
        generated_column: 0,
        original_line,
        original_column: 0,
        name: None,
    };
    let table = traceback_table(&[mapping(0, 4), mapping(0, 2), mapping(3, 7)]);
    assert_eq!(table.into_iter().collect::<Vec<_>>(), vec![(1, 3), (4, 8)]);
}

#[test]
fn test_traceback_placeholder_is_replaced() {
    let options = PrintOptions {
        source_map_traceback: true,
        lua_lib_import: LuaLibImportKind::None,
        ..bare_options()
    };
    let statements = vec![
        Statement::local_one(Identifier::new("a"), Some(num(1.0))).with_range(range(0, 0)),
        Statement::local_one(Identifier::new("b"), Some(num(2.0))).with_range(range(4, 0)),
    ];
    let output = print_lua(&Block::new(statements), "a.ts", &BTreeSet::new(), &options).expect("print failed");
    assert!(!output.code.contains(TRACEBACK_PLACEHOLDER));
    assert_eq!(
        output.code,
        "__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {[\"2\"] = 1, [\"3\"] = 5});\n\
         local a = 1;\nlocal b = 2;\n"
    );
}
