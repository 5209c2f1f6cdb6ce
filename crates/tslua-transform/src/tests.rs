//! Lowering tests: TypeScript in, printed Lua out.

use super::*;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_lualib::LuaLibImportKind;
use rhizome_tslua_printer::{PrintOptions, print_lua};
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{CheckerOptions, SyntaxKind, parse};

struct Transpiled {
    lua: String,
    diagnostics: Vec<Diagnostic>,
    features: BTreeSet<LuaLibFeature>,
}

impl Transpiled {
    fn codes(&self) -> Vec<DiagnosticCode> {
        self.diagnostics.iter().map(|diagnostic| diagnostic.code).collect()
    }

    fn assert_contains(&self, needle: &str) {
        assert!(self.lua.contains(needle), "expected `{}` in:\n{}", needle, self.lua);
    }

    fn assert_not_contains(&self, needle: &str) {
        assert!(!self.lua.contains(needle), "unexpected `{}` in:\n{}", needle, self.lua);
    }
}

fn transpile_with(source: &str, options: &CompilerOptions, visitors: &VisitorMap) -> Result<Transpiled, TransformError> {
    let file = parse(source, "test.ts").expect("parse failed");
    let checker = Checker::new(
        &file,
        CheckerOptions {
            no_implicit_self: options.no_implicit_self,
        },
    )
    .expect("checker failed");
    let output = transform_file(&file, &checker, options, visitors)?;
    let print_options = PrintOptions {
        no_header: true,
        lua_lib_import: LuaLibImportKind::None,
        ..PrintOptions::default()
    };
    let printed =
        print_lua(&output.block, "test.ts", &output.used_features, &print_options).expect("print failed");
    Ok(Transpiled {
        lua: printed.code,
        diagnostics: output.diagnostics,
        features: output.used_features,
    })
}

fn transpile(source: &str) -> Transpiled {
    transpile_with(source, &CompilerOptions::default(), standard_visitors()).expect("transform failed")
}

/// Source with plain calls, so expectations need no `self` arguments.
fn transpile_no_self(source: &str) -> Transpiled {
    transpile(&format!("/** @noSelfInFile */\n{}", source))
}

// =============================================================================
// Arrays and strings
// =============================================================================

#[test]
fn test_array_index_is_shifted() {
    let out = transpile_no_self("function get(a: number[], i: number) { return a[i]; }");
    out.assert_contains("return a[i + 1];");
}

#[test]
fn test_literal_array_index_is_folded() {
    let out = transpile_no_self("function first(a: number[]) { return a[0]; }");
    out.assert_contains("return a[1];");
}

#[test]
fn test_index_adjustment_cancels() {
    let out = transpile_no_self("function previous(a: number[], i: number) { return a[i - 1]; }");
    out.assert_contains("return a[i];");
    out.assert_not_contains("i - 1");
}

#[test]
fn test_array_write_uses_same_shift() {
    let out = transpile_no_self("function set(a: number[], i: number, v: number) { a[i] = v; }");
    out.assert_contains("a[i + 1] = v;");
}

#[test]
fn test_non_array_index_is_not_shifted() {
    let out = transpile_no_self("function get(t: { [key: string]: number }, k: string) { return t[k]; }");
    out.assert_contains("return t[k];");
}

#[test]
fn test_string_index_is_substring() {
    let out = transpile_no_self("function at(s: string, i: number) { return s[i]; }");
    out.assert_contains("string.sub(s, i + 1, i + 1)");
}

#[test]
fn test_single_push_is_inlined() {
    let out = transpile_no_self("function add(a: number[]) { a.push(1); }");
    out.assert_contains("a[#a + 1] = 1;");
    assert!(!out.features.contains(&LuaLibFeature::ArrayPush));
}

#[test]
fn test_push_caches_complex_receiver() {
    let out = transpile_no_self("function add(o: { items: number[] }) { o.items.push(1); }");
    out.assert_contains("local ____o_items_");
    out.assert_not_contains("o.items[#o.items + 1]");
}

#[test]
fn test_multi_push_uses_lualib() {
    let out = transpile_no_self("function add(a: number[]) { a.push(1, 2); }");
    out.assert_contains("__TS__ArrayPush(a, 1, 2)");
    assert!(out.features.contains(&LuaLibFeature::ArrayPush));
}

#[test]
fn test_array_methods() {
    let out = transpile_no_self(
        "function f(a: number[], names: string[]) {
            const doubled = a.map(x => x * 2);
            const last = a.pop();
            const text = names.join(\", \");
            return [doubled, last, text];
        }",
    );
    out.assert_contains("__TS__ArrayMap(a, ");
    out.assert_contains("table.remove(a)");
    out.assert_contains("table.concat(names, \", \")");
    assert!(out.features.contains(&LuaLibFeature::ArrayMap));
}

#[test]
fn test_length() {
    let out = transpile_no_self("function size(a: number[], s: string) { return a.length + s.length; }");
    out.assert_contains("return #a + #s;");
}

#[test]
fn test_string_methods() {
    let out = transpile_no_self(
        "function f(s: string) {
            return [s.toUpperCase(), s.split(\",\"), s.indexOf(\"x\")];
        }",
    );
    out.assert_contains("string.upper(s)");
    out.assert_contains("__TS__StringSplit(s, \",\")");
    out.assert_contains("(string.find(s, \"x\", 1, true) or 0) - 1");
}

#[test]
fn test_math_and_console() {
    let out = transpile_no_self("function f(x: number) { console.log(Math.floor(x), Math.PI); }");
    out.assert_contains("print(math.floor(x), math.pi)");
}

#[test]
fn test_unsupported_builtin_property() {
    let out = transpile_no_self("function f(x: number) { return Math.fround(x); }");
    assert_eq!(out.codes(), vec![DiagnosticCode::UnsupportedProperty]);
}

// =============================================================================
// Optional chains
// =============================================================================

#[test]
fn test_optional_method_call_reads_method_once() {
    let out = transpile("declare const o: { m?(n: number): number };\nconst r = o.m?.(1);");
    assert_eq!(out.lua.matches("o.m").count(), 1, "{}", out.lua);
    out.assert_contains("if ____o_m_0 ~= nil then");
    out.assert_contains("____o_m_0(o, 1)");
    out.assert_not_contains("o:m(");
}

// =============================================================================
// Assignments
// =============================================================================

#[test]
fn test_logical_assignment_is_guarded() {
    let out = transpile_no_self(
        "declare function sideEffect(): number;
        function f(obj: { prop: number }) { obj.prop ||= sideEffect(); }",
    );
    out.assert_contains("if not obj.prop then");
    out.assert_contains("obj.prop = sideEffect()");
}

#[test]
fn test_compound_assignment_evaluates_target_once() {
    let out = transpile_no_self(
        "declare function key(): string;
        function f(t: { [k: string]: number }) { t[key()] += 1; }",
    );
    assert_eq!(out.lua.matches("key()").count(), 1, "{}", out.lua);
}

// =============================================================================
// Multi-value returns
// =============================================================================

#[test]
fn test_multi_return_forwarding_is_not_wrapped() {
    let out = transpile_no_self(
        "declare function multiReturn(): LuaMultiReturn<[number, number]>;
        function f() { return multiReturn(); }",
    );
    out.assert_contains("return multiReturn();");
}

#[test]
fn test_forwarding_function_is_multi_at_call_sites() {
    let out = transpile_no_self(
        "declare function multiReturn(): LuaMultiReturn<[number, number]>;
        function f() { return multiReturn(); }
        function g() { const [c, d] = f(); const t = f(); return c + d + t[0]; }",
    );
    out.assert_contains("local c, d = f();");
    out.assert_contains("local t = {f()};");
}

#[test]
fn test_multi_call_returned_from_plain_function_is_wrapped() {
    let out = transpile_no_self(
        "declare function multiReturn(): LuaMultiReturn<[number, number]>;
        function f(): number[] { return multiReturn(); }
        const g = (): number[] => multiReturn();",
    );
    out.assert_contains("return {multiReturn()};");
    out.assert_contains("return {multiReturn()} end");
}

#[test]
fn test_multi_return_value_is_wrapped_once() {
    let out = transpile_no_self(
        "declare function multiReturn(): LuaMultiReturn<[number, number]>;
        function f() { const x = multiReturn(); return x; }",
    );
    out.assert_contains("local x = {multiReturn()};");
    out.assert_not_contains("{{");
}

#[test]
fn test_multi_return_destructuring_is_not_wrapped() {
    let out = transpile_no_self(
        "declare function multiReturn(): LuaMultiReturn<[number, number]>;
        function f() { const [a, b] = multiReturn(); return a + b; }",
    );
    out.assert_contains("local a, b = multiReturn();");
}

#[test]
fn test_multi_helper_returns_values() {
    let out = transpile_no_self("function f(): LuaMultiReturn<[number, string]> { return $multi(1, \"a\"); }");
    out.assert_contains("return 1, \"a\";");
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_multi_helper_outside_return_is_reported() {
    let out = transpile_no_self("function f() { const t = $multi(1, 2); return t; }");
    assert_eq!(out.codes(), vec![DiagnosticCode::InvalidMultiFunctionUse]);
}

// =============================================================================
// Spread
// =============================================================================

#[test]
fn test_rest_parameter_spread_forwards_varargs() {
    let out = transpile_no_self(
        "declare function g(...values: number[]): number;
        function f(...args: number[]) { return g(...args); }",
    );
    out.assert_contains("return g(...);");
}

#[test]
fn test_reassigned_rest_parameter_is_unpacked() {
    let out = transpile_no_self(
        "declare function g(...values: number[]): number;
        function f(...args: number[]) { args = [1]; return g(...args); }",
    );
    out.assert_not_contains("g(...)");
}

// =============================================================================
// Blocks and declarations
// =============================================================================

#[test]
fn test_dead_code_after_return_is_dropped() {
    let out = transpile_no_self("function f() { return 3; const unused = 8; }");
    out.assert_contains("return 3;");
    out.assert_not_contains("unused");
}

#[test]
fn test_script_declarations_are_globals() {
    let out = transpile("let x = 1;");
    assert_eq!(out.lua, "x = 1;\n");
}

#[test]
fn test_module_exports() {
    let out = transpile("export const x = 1;\nconst y = 2;\nexport { y as z };");
    assert!(out.lua.starts_with("local ____exports = {}\n") || out.lua.starts_with("local ____exports = {};\n"));
    out.assert_contains("____exports.x = 1;");
    out.assert_contains("local y = 2;");
    out.assert_contains("____exports.z = y;");
    assert!(out.lua.ends_with("return ____exports;\n"));
}

#[test]
fn test_var_is_a_warning() {
    let out = transpile_no_self("function f() { var x = 1; return x; }");
    assert_eq!(out.codes(), vec![DiagnosticCode::UnsupportedVarDeclaration]);
    assert_eq!(out.diagnostics[0].category, DiagnosticCategory::Warning);
}

#[test]
fn test_reference_before_declaration_without_hoisting() {
    let source = "/** @noSelfInFile */
        function f() {
            const y = x + 1;
            let x = 1;
            return y + g();
            function g() { return 2; }
        }";
    let options = CompilerOptions {
        no_hoisting: true,
        ..CompilerOptions::default()
    };
    let out = transpile_with(source, &options, standard_visitors()).expect("transform failed");
    assert_eq!(
        out.codes(),
        vec![
            DiagnosticCode::ReferencedBeforeDeclaration,
            DiagnosticCode::ReferencedBeforeDeclaration,
        ]
    );
    assert!(out.diagnostics[0].message.contains("'x'"));
    assert!(out.diagnostics[1].message.contains("'g'"));

    assert!(transpile(source).diagnostics.is_empty());
}

#[test]
fn test_await_outside_async_is_reported() {
    let out = transpile_no_self("declare const p: Promise<number>; function f() { return await p; }");
    assert!(out.codes().contains(&DiagnosticCode::AwaitMustBeInAsyncFunction));
}

// =============================================================================
// Enums
// =============================================================================

#[test]
fn test_enum_auto_increment() {
    let out = transpile("enum E { A, B, C }");
    out.assert_contains("E.A = 0;");
    out.assert_contains("E.B = 1;");
    out.assert_contains("E.C = 2;");
    out.assert_contains("E[E.A] = \"A\";");
}

#[test]
fn test_enum_auto_increment_from_initializer() {
    let out = transpile("enum E { A = 5, B, C }");
    out.assert_contains("E.A = 5;");
    out.assert_contains("E.B = 6;");
    out.assert_contains("E.C = 7;");
}

#[test]
fn test_string_enum_has_no_reverse_mapping() {
    let out = transpile("enum S { X = \"x\", Y = \"y\" }");
    out.assert_contains("S.X = \"x\";");
    out.assert_not_contains("S[S.X]");
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_heterogeneous_enum_is_rejected() {
    let out = transpile("enum H { A = \"a\", B }");
    assert_eq!(out.codes(), vec![DiagnosticCode::HeterogeneousEnum]);
}

#[test]
fn test_explicit_mixed_enum_is_accepted() {
    // Both orders behave the same once every member has an initializer.
    let numeric_first = transpile("enum M { A = 1, B = \"b\" }");
    let string_first = transpile("enum M { B = \"b\", A = 1 }");
    assert!(numeric_first.diagnostics.is_empty());
    assert!(string_first.diagnostics.is_empty());
}

#[test]
fn test_const_enum_is_inlined() {
    let out = transpile_no_self("const enum Dir { Up = 1, Down }\nfunction f() { return Dir.Down; }");
    out.assert_contains("return 2;");
    out.assert_not_contains("Dir");
}

// =============================================================================
// Classes
// =============================================================================

#[test]
fn test_class_table() {
    let out = transpile(
        "class Point {
            x = 0;
            constructor(public y: number) {}
            length() { return this.x + this.y; }
        }",
    );
    out.assert_contains("Point.__index = Point;");
    out.assert_contains("Point.name = \"Point\";");
    out.assert_contains("function Point.new(");
    out.assert_contains("function Point.constructor(self, y)");
    out.assert_contains("function Point.length(self)");
    out.assert_contains("self.x = 0;");
}

#[test]
fn test_class_inheritance() {
    let out = transpile(
        "class A {
            constructor() {}
            greet() { return 1; }
        }
        class B extends A {
            constructor() { super(); }
            greet() { return super.greet() + 1; }
        }",
    );
    out.assert_contains("setmetatable({}, A)");
    out.assert_contains("B.__base = A;");
    out.assert_contains("A.new(false)");
    out.assert_contains("B.__base.constructor(self)");
    out.assert_contains("B.__base.greet(self) + 1");
}

#[test]
fn test_accessors() {
    let out = transpile_no_self(
        "class C {
            get size() { return 1; }
            set size(value: number) {}
        }
        function f(c: C) { c.size = c.size + 1; }",
    );
    out.assert_contains("function C.get__size(self)");
    out.assert_contains("function C.set__size(self, value)");
    out.assert_contains("c:set__size(c:get__size() + 1)");
}

// =============================================================================
// Dispatch
// =============================================================================

fn doubled_number<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<rhizome_tslua_ast::Expression>, TransformError> {
    let value = context.super_transform_expression(expression)?;
    Ok(Some(rhizome_tslua_ast::Expression::binary(
        value,
        BinaryOperator::Mul,
        rhizome_tslua_ast::Expression::number(2.0),
    )))
}

#[test]
fn test_override_calls_overridden_visitor() {
    let mut visitors = standard_visitors().clone();
    visitors.register_expression(SyntaxKind::NumericLiteral, "doubled_number", doubled_number);
    assert_eq!(visitors.stack(SyntaxKind::NumericLiteral).len(), 2);

    let out = transpile_with("let x = 21;", &CompilerOptions::default(), &visitors).expect("transform failed");
    assert_eq!(out.lua, "x = 21 * 2;\n");
}

#[test]
fn test_super_call_without_lower_visitor_fails() {
    let mut visitors = VisitorMap::new();
    let variable = standard_visitors().stack(SyntaxKind::VariableStatement)[0];
    visitors.register(SyntaxKind::VariableStatement, variable);
    visitors.register_expression(SyntaxKind::NumericLiteral, "doubled_number", doubled_number);

    let result = transpile_with("let x = 21;", &CompilerOptions::default(), &visitors);
    assert!(matches!(result, Err(TransformError::NoSuperVisitor { .. })));
}

#[test]
fn test_missing_visitor_is_a_diagnostic() {
    let visitors = VisitorMap::new();
    let out = transpile_with("let x = 1;", &CompilerOptions::default(), &visitors).expect("transform failed");
    assert_eq!(out.lua, "");
    assert_eq!(out.codes(), vec![DiagnosticCode::UnsupportedKind]);
}

#[test]
fn test_diagnostic_display() {
    let out = transpile_no_self("function f(x: number) {\n  return Math.fround(x);\n}");
    let rendered = out.diagnostics[0].to_string();
    assert!(rendered.starts_with("test.ts:3:10 - error TL1002: "), "{}", rendered);
}
