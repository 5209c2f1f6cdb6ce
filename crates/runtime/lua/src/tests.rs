//! Tests for rhizome-tslua-runtime-lua.

use super::*;
use serde_json::json;

#[test]
fn test_execute_lua() {
    assert_eq!(execute("return 1 + 2").unwrap(), json!(3));
    assert_eq!(execute("return \"hi\"").unwrap(), json!("hi"));
    assert_eq!(execute("return {1, 2, 3}").unwrap(), json!([1, 2, 3]));
    assert_eq!(execute("return nil").unwrap(), json!(null));
}

#[test]
fn test_execute_first_value_only() {
    assert_eq!(execute("return 1, 2").unwrap(), json!(1));
}

#[test]
fn test_lualib_bundle_is_preloaded() {
    let value = execute(
        "require(\"lualib_bundle\")\nreturn __TS__ArrayMap({1, 2}, function(_, x) return x * 10 end)",
    )
    .unwrap();
    assert_eq!(value, json!([10, 20]));
}

#[test]
fn test_runtime_is_reusable() {
    let lua = create_runtime().unwrap();
    execute_in(&lua, "counter = 1").unwrap();
    assert_eq!(execute_in(&lua, "return counter + 1").unwrap(), json!(2));
}

#[test]
fn test_lua_error() {
    assert!(matches!(execute("error(\"boom\")"), Err(ExecutionError::Lua(_))));
}

#[test]
fn test_error_diagnostics_stop_execution() {
    let result = execute_ts("export const x = Math.fround(1);", &CompilerOptions::default());
    let Err(ExecutionError::Diagnostics(diagnostics)) = result else {
        panic!("expected diagnostics");
    };
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].to_string().contains("TL1002"));
}

#[test]
fn test_warnings_do_not_stop_execution() {
    let value = execute_ts("var x = 1;\nexport const y = x + 1;", &CompilerOptions::default()).unwrap();
    assert_eq!(value, json!({ "y": 2 }));
}
