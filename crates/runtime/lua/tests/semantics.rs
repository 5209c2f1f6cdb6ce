//! Runtime semantics of transpiled code.
//!
//! Each scenario is a module whose exports come back as a JSON object.

use rhizome_tslua_core::{CompilerOptions, DiagnosticCode, LuaTarget};
use rhizome_tslua_runtime_lua::{ExecutionError, execute_ts};
use serde_json::{Value, json};

fn run_with(source: &str, options: &CompilerOptions) -> Value {
    match execute_ts(source, options) {
        Ok(value) => value,
        Err(err) => panic!("execution failed: {}\nsource:\n{}", err, source),
    }
}

fn run(source: &str) -> Value {
    run_with(source, &CompilerOptions::default())["result"].clone()
}

// ============================================================================
// Assignment and update
// ============================================================================

#[test]
fn test_postfix_increment_yields_old_value() {
    let result = run("let x = 5;\nconst y = x++;\nexport const result = [y, x];");
    assert_eq!(result, json!([5, 6]));
}

#[test]
fn test_prefix_increment_yields_new_value() {
    let result = run("let x = 5;\nconst y = ++x;\nconst z = x--;\nexport const result = [y, z, x];");
    assert_eq!(result, json!([6, 6, 5]));
}

#[test]
fn test_logical_or_assignment_skips_rhs() {
    let result = run(
        "let counter = 0;
        function sideEffect(): number {
            counter++;
            return 1;
        }
        const obj = { prop: 7 };
        obj.prop ||= sideEffect();
        export const result = [obj.prop, counter];",
    );
    assert_eq!(result, json!([7, 0]));
}

#[test]
fn test_logical_assignment_evaluates_rhs_when_needed() {
    let result = run(
        "let counter = 0;
        function sideEffect(): number {
            counter++;
            return 10;
        }
        const a: { prop?: number } = {};
        a.prop ||= sideEffect();
        const b: { prop?: number } = {};
        b.prop ??= sideEffect();
        const c = { prop: 3 };
        c.prop &&= sideEffect();
        export const result = [a.prop, b.prop, c.prop, counter];",
    );
    assert_eq!(result, json!([10, 10, 10, 3]));
}

#[test]
fn test_compound_assignment_on_computed_key() {
    let result = run(
        "let calls = 0;
        function key(): string {
            calls++;
            return \"n\";
        }
        const t: { [k: string]: number } = { n: 1 };
        t[key()] += 41;
        export const result = [t.n, calls];",
    );
    assert_eq!(result, json!([42, 1]));
}

// ============================================================================
// Arrays and tuples
// ============================================================================

#[test]
fn test_array_index_round_trip() {
    let result = run(
        "const a = [0, 0, 0, 0];
        for (let i = 0; i < a.length; i++) {
            a[i] = i * 10;
        }
        const read: number[] = [];
        for (let i = 0; i < a.length; i++) {
            read.push(a[i]);
        }
        export const result = read;",
    );
    assert_eq!(result, json!([0, 10, 20, 30]));
}

#[test]
fn test_shifted_index_reads_previous() {
    let result = run(
        "const a = [1, 2, 3];
        function previous(i: number) { return a[i - 1]; }
        export const result = [previous(1), previous(3)];",
    );
    assert_eq!(result, json!([1, 3]));
}

#[test]
fn test_push_through_cached_receiver() {
    let result = run(
        "let lookups = 0;
        const holder = { items: [1] };
        function get() {
            lookups++;
            return holder;
        }
        const length = get().items.push(2);
        export const result = [length, holder.items, lookups];",
    );
    assert_eq!(result, json!([2, [1, 2], 1]));
}

#[test]
fn test_array_methods() {
    let result = run(
        "const xs = [3, 1, 2];
        const doubled = xs.map(x => x * 2);
        const odd = xs.filter(x => x % 2 == 1);
        const sum = xs.reduce((acc, x) => acc + x, 0);
        const found = xs.indexOf(2);
        const joined = [\"a\", \"b\"].join(\"-\");
        const last = xs.pop();
        export const result = [doubled, odd, sum, found, joined, last, xs.length];",
    );
    assert_eq!(result, json!([[6, 2, 4], [3, 1], 6, 2, "a-b", 2, 2]));
}

#[test]
fn test_multi_return_forwarding() {
    let result = run(
        "function pair(): LuaMultiReturn<[number, number]> {
            return $multi(1, 2);
        }
        function forward(): LuaMultiReturn<[number, number]> {
            return pair();
        }
        const [a, b] = forward();
        const wrapped = pair();
        export const result = [a, b, wrapped.length, wrapped[1]];",
    );
    assert_eq!(result, json!([1, 2, 2, 2]));
}

#[test]
fn test_inferred_multi_return_destructures() {
    let result = run(
        "function m(): LuaMultiReturn<[number, number]> {
            return $multi(3, 4);
        }
        function f() {
            return m();
        }
        const [c, d] = f();
        const all = f();
        export const result = [c, d, all[1]];",
    );
    assert_eq!(result, json!([3, 4, 4]));
}

#[test]
fn test_multi_call_returned_as_array() {
    let result = run(
        "function m(): LuaMultiReturn<[number, number]> {
            return $multi(3, 4);
        }
        function f(): number[] {
            return m();
        }
        const y = f();
        export const result = [y[0], y.length];",
    );
    assert_eq!(result, json!([3, 2]));
}

#[test]
fn test_spread_and_rest() {
    let result = run(
        "function sum(...values: number[]): number {
            let total = 0;
            for (const value of values) {
                total += value;
            }
            return total;
        }
        function forward(...args: number[]) {
            return sum(...args);
        }
        const extra = [4, 5];
        export const result = [forward(1, 2, 3), sum(...extra), Math.max(...[1, 9, 3]), [0, ...extra]];",
    );
    assert_eq!(result, json!([6, 9, 9, [0, 4, 5]]));
}

#[test]
fn test_destructuring() {
    let result = run(
        "const { x, y: renamed } = { x: 1, y: 2 };
        const [first, , third = 30] = [10, 20];
        let a = 1;
        let b = 2;
        [a, b] = [b, a];
        export const result = [x, renamed, first, third, a, b];",
    );
    assert_eq!(result, json!([1, 2, 10, 30, 2, 1]));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_escapes_survive() {
    let result = run(r#"export const result = "a\\b'c\"d\ne\rf\tg\0h";"#);
    assert_eq!(result, json!("a\\b'c\"d\ne\rf\tg\0h"));
}

#[test]
fn test_string_methods() {
    let result = run(
        "const s = \"Hello, World\";
        const name = \"tslua\";
        export const result = [
            s.toUpperCase(),
            s.length,
            s[0],
            s.charAt(7),
            s.substring(0, 5),
            s.indexOf(\"World\"),
            s.split(\", \"),
            s.startsWith(\"Hell\"),
            `${name} v${1 + 1}`,
        ];",
    );
    assert_eq!(
        result,
        json!(["HELLO, WORLD", 12, "H", "W", "Hello", 7, ["Hello", "World"], true, "tslua v2"])
    );
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_values() {
    let result = run(
        "enum E { A, B, C }
        enum F { A = 5, B, C }
        enum S { X = \"x\" }
        export const result = [E.A, E.B, E.C, F.A, F.B, F.C, E[E.B], S.X];",
    );
    assert_eq!(result, json!([0, 1, 2, 5, 6, 7, "B", "x"]));
}

#[test]
fn test_heterogeneous_enum_does_not_run() {
    let result = execute_ts("enum H { A = \"a\", B }\nexport const result = H.A;", &CompilerOptions::default());
    let Err(ExecutionError::Diagnostics(diagnostics)) = result else {
        panic!("expected a diagnostic");
    };
    assert_eq!(diagnostics[0].code, DiagnosticCode::HeterogeneousEnum);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_dead_code_after_return() {
    let result = run(
        "function f() {
            return 3;
            const unused = 8;
        }
        export const result = f();",
    );
    assert_eq!(result, json!(3));
}

#[test]
fn test_switch_fallthrough() {
    let result = run(
        "function classify(n: number): string[] {
            const out: string[] = [];
            switch (n) {
                case 1:
                    out.push(\"one\");
                case 2:
                    out.push(\"two\");
                    break;
                case 3:
                    out.push(\"three\");
                    break;
                default:
                    out.push(\"other\");
            }
            return out;
        }
        export const result = [classify(1), classify(2), classify(3), classify(9)];",
    );
    assert_eq!(result, json!([["one", "two"], ["two"], ["three"], ["other"]]));
}

#[test]
fn test_try_catch_return() {
    let result = run(
        "function attempt(fail: boolean): string {
            try {
                if (fail) {
                    throw \"bad\";
                }
                return \"ok\";
            } catch (e) {
                return \"caught \" + e;
            }
        }
        export const result = [attempt(false), attempt(true)];",
    );
    assert_eq!(result, json!(["ok", "caught bad"]));
}

#[test]
fn test_finally_runs_after_return() {
    let result = run(
        "const log: string[] = [];
        function work(): number {
            try {
                log.push(\"try\");
                return 1;
            } finally {
                log.push(\"finally\");
            }
        }
        const value = work();
        export const result = [value, log];",
    );
    assert_eq!(result, json!([1, ["try", "finally"]]));
}

const LOOPS: &str = "let odd = 0;
for (const n of [1, 2, 3, 4, 5]) {
    if (n % 2 == 0) {
        continue;
    }
    odd += n;
}
let i = 0;
while (true) {
    i++;
    if (i >= 4) {
        break;
    }
}
let j = 0;
do {
    j += 2;
} while (j < 5);
export const result = [odd, i, j];";

#[test]
fn test_loops_with_continue_and_break() {
    let options = CompilerOptions {
        lua_target: LuaTarget::LuaJit,
        ..CompilerOptions::default()
    };
    assert_eq!(run_with(LOOPS, &options)["result"], json!([9, 4, 6]));
}

#[test]
fn test_continue_needs_goto() {
    let result = execute_ts(LOOPS, &CompilerOptions::default());
    let Err(ExecutionError::Diagnostics(diagnostics)) = result else {
        panic!("expected a diagnostic");
    };
    assert_eq!(diagnostics[0].code, DiagnosticCode::UnsupportedForTarget);
}

#[test]
fn test_for_in_over_object() {
    let result = run(
        "const scores: { [name: string]: number } = { a: 1, b: 2, c: 3 };
        let total = 0;
        for (const key in scores) {
            total += scores[key];
        }
        export const result = total;",
    );
    assert_eq!(result, json!(6));
}

#[test]
fn test_conditional_and_nullish() {
    let result = run(
        "const maybe: { inner?: { value: number } } = {};
        const present = { inner: { value: 4 } };
        const fallback = maybe.inner?.value ?? 5;
        const direct = present.inner?.value ?? 5;
        const picked = direct > 3 ? \"big\" : \"small\";
        export const result = [fallback, direct, picked];",
    );
    assert_eq!(result, json!([5, 4, "big"]));
}

#[test]
fn test_optional_method_call() {
    let result = run(
        "type Scaler = { k: number; m?(n: number): number };
        const with_method: Scaler = {
            k: 2,
            m(n: number) {
                return n * this.k;
            },
        };
        const without: Scaler = { k: 2 };
        export const result = [with_method.m?.(5), without.m?.(5) ?? -1];",
    );
    assert_eq!(result, json!([10, -1]));
}

// ============================================================================
// Functions and hoisting
// ============================================================================

#[test]
fn test_function_hoisting() {
    let result = run(
        "const early = twice(21);
        function twice(n: number) {
            return n * 2;
        }
        export const result = early;",
    );
    assert_eq!(result, json!(42));
}

#[test]
fn test_hoisted_variable_read_from_closure() {
    let result = run(
        "function read() {
            return value;
        }
        let value = 5;
        export const result = read();",
    );
    assert_eq!(result, json!(5));
}

#[test]
fn test_closures() {
    let result = run(
        "function counter() {
            let n = 0;
            return () => ++n;
        }
        const next = counter();
        next();
        next();
        export const result = next();",
    );
    assert_eq!(result, json!(3));
}

#[test]
fn test_object_methods_bind_this() {
    let result = run(
        "const counter = {
            n: 0,
            inc() {
                this.n++;
                return this.n;
            },
        };
        counter.inc();
        export const result = counter.inc();",
    );
    assert_eq!(result, json!(2));
}

#[test]
fn test_no_implicit_self() {
    let options = CompilerOptions {
        no_implicit_self: true,
        ..CompilerOptions::default()
    };
    let exports = run_with(
        "function add(a: number, b: number) {
            return a + b;
        }
        export const result = add(1, 2);",
        &options,
    );
    assert_eq!(exports["result"], json!(3));
}
