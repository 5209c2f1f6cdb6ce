//! Module exports, scripts, and the ways output reaches the lualib helpers.

use rhizome_tslua_core::{CompilerOptions, transpile_string};
use rhizome_tslua_lualib::LuaLibImportKind;
use rhizome_tslua_runtime_lua::{ExecutionError, create_runtime, execute, execute_in, execute_ts};
use serde_json::json;

const USES_LUALIB: &str = "const words = [\"b\", \"a\"].map(w => w.toUpperCase());\nexport const result = words;";

fn options(lua_lib_import: LuaLibImportKind) -> CompilerOptions {
    CompilerOptions {
        lua_lib_import,
        ..CompilerOptions::default()
    }
}

#[test]
fn test_module_exports() {
    // Exported functions cannot be converted to JSON, so read fields in Lua.
    let lua = create_runtime().unwrap();
    let output = transpile_string(
        "export const a = 1;
        const b = 2;
        export { b as renamed };
        export let counter = 0;
        export function bump() {
            counter++;
        }
        bump();
        export default \"main\";",
        "main.ts",
        &CompilerOptions::default(),
    )
    .unwrap();
    let chunk = format!(
        "local exports = (function()\n{}\nend)()\nreturn {{exports.a, exports.renamed, exports.counter, exports.default, type(exports.bump)}}",
        output.lua
    );
    assert_eq!(execute_in(&lua, &chunk).unwrap(), json!([1, 2, 1, "main", "function"]));
}

#[test]
fn test_script_declares_globals() {
    let lua = create_runtime().unwrap();
    let output = transpile_string("let shared = 40;\nfunction addTwo() { shared += 2; }", "script.ts", &CompilerOptions::default())
        .unwrap();
    execute_in(&lua, &output.lua).unwrap();
    assert_eq!(execute_in(&lua, "addTwo(nil)\nreturn shared").unwrap(), json!(42));
}

#[test]
fn test_require_mode() {
    let value = execute_ts(USES_LUALIB, &options(LuaLibImportKind::Require)).unwrap();
    assert_eq!(value["result"], json!(["B", "A"]));
}

#[test]
fn test_inline_mode_needs_no_bundle() {
    let output = transpile_string(USES_LUALIB, "main.ts", &options(LuaLibImportKind::Inline)).unwrap();
    assert!(!output.lua.contains("require("));
    // A bare state without the preloaded bundle.
    let lua = mlua::Lua::new();
    assert_eq!(execute_in(&lua, &output.lua).unwrap()["result"], json!(["B", "A"]));
}

#[test]
fn test_none_mode_relies_on_host() {
    let output = transpile_string(USES_LUALIB, "main.ts", &options(LuaLibImportKind::None)).unwrap();
    assert!(matches!(execute(&output.lua), Err(ExecutionError::Lua(_))));

    let lua = create_runtime().unwrap();
    execute_in(&lua, "require(\"lualib_bundle\")").unwrap();
    assert_eq!(execute_in(&lua, &output.lua).unwrap()["result"], json!(["B", "A"]));
}

#[test]
fn test_always_mode_requires_without_features() {
    let output = transpile_string("export const result = 1;", "main.ts", &options(LuaLibImportKind::Always)).unwrap();
    assert!(output.lua.contains("require(\"lualib_bundle\");"));
    assert_eq!(execute(&output.lua).unwrap()["result"], json!(1));
}

#[test]
fn test_namespace() {
    let value = execute_ts(
        "namespace Geometry {
            export const unit = 1;
            export function double(n: number) {
                return n * 2;
            }
        }
        export const result = Geometry.double(Geometry.unit);",
        &CompilerOptions::default(),
    )
    .unwrap();
    assert_eq!(value["result"], json!(2));
}

#[test]
fn test_traceback_output_loads() {
    let options = CompilerOptions {
        source_map_traceback: true,
        ..CompilerOptions::default()
    };
    let output = transpile_string("export const x = 1;", "main.ts", &options).unwrap();
    let lua = create_runtime().unwrap();
    lua.load(&output.lua).set_name("main.lua").into_function().unwrap();
}
