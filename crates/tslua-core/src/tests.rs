//! Tests for the transpiler driver.

use super::*;
use rhizome_tslua_lualib::LuaLibImportKind;

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_top_level_keys() {
    let options = parse_config("luaTarget = \"JIT\"\nnoHeader = true\n").unwrap();
    assert_eq!(options.lua_target, LuaTarget::LuaJit);
    assert!(options.no_header);
    assert!(options.strict);
}

#[test]
fn test_config_section() {
    let options = parse_config(
        "[tslua]\nluaTarget = \"5.3\"\nluaLibImport = \"inline\"\nsourceMapTraceback = true\nstrict = false\n",
    )
    .unwrap();
    assert_eq!(options.lua_target, LuaTarget::Lua53);
    assert_eq!(options.lua_lib_import, LuaLibImportKind::Inline);
    assert!(options.source_map_traceback);
    assert!(!options.strict);
}

#[test]
fn test_config_empty_is_default() {
    assert_eq!(parse_config("").unwrap(), CompilerOptions::default());
}

#[test]
fn test_config_bad_value() {
    let result = parse_config("luaTarget = \"6.0\"\n");
    assert!(matches!(result, Err(TranspileError::Config(_))));
}

#[test]
fn test_load_config_in_missing_dir_file() {
    let dir = std::env::temp_dir().join("tslua-core-no-config");
    std::fs::create_dir_all(&dir).unwrap();
    let _ = std::fs::remove_file(dir.join(CONFIG_FILE_NAME));
    assert_eq!(load_config_in(&dir).unwrap(), CompilerOptions::default());
}

// =============================================================================
// Transpile
// =============================================================================

#[test]
fn test_transpile_string_defaults() {
    let output = transpile_string("const xs = [1, 2];\nconst ys = xs.map(x => x * 2);", "main.ts", &CompilerOptions::default())
        .unwrap();
    assert!(output.lua.starts_with("--[[ Generated with tslua ]]\n"));
    assert!(output.lua.contains("require(\"lualib_bundle\");"));
    assert!(output.lua.contains("__TS__ArrayMap("));
    assert!(output.used_features.contains(&LuaLibFeature::ArrayMap));
    assert!(output.source_map.is_none());
    assert!(output.diagnostics.is_empty());
    assert!(!output.lua_ast.statements.is_empty());
}

#[test]
fn test_transpile_without_features_has_no_require() {
    let output = transpile_string("let x = 1;", "main.ts", &CompilerOptions::default()).unwrap();
    assert!(!output.lua.contains("require("));
}

#[test]
fn test_transpile_inline_lualib() {
    let options = CompilerOptions {
        lua_lib_import: LuaLibImportKind::Inline,
        no_header: true,
        ..CompilerOptions::default()
    };
    let output = transpile_string("const xs = [1].map(x => x);", "main.ts", &options).unwrap();
    assert!(output.lua.starts_with("-- Lua Library inline imports\n"));
    assert!(output.lua.contains("function __TS__ArrayMap("));
    assert!(!output.lua.contains("require("));
}

#[test]
fn test_transpile_source_map() {
    let options = CompilerOptions {
        source_map: true,
        ..CompilerOptions::default()
    };
    let output = transpile_string("let x = 1;\nlet y = x;", "src/main.ts", &options).unwrap();
    let map: serde_json::Value = serde_json::from_str(output.source_map.as_deref().unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "src/main.lua");
    assert_eq!(map["sources"][0], "src/main.ts");
    assert!(!map["mappings"].as_str().unwrap().is_empty());
}

#[test]
fn test_transpile_traceback() {
    let options = CompilerOptions {
        source_map_traceback: true,
        lua_lib_import: LuaLibImportKind::None,
        no_header: true,
        ..CompilerOptions::default()
    };
    let output = transpile_string("let x = 1;", "main.ts", &options).unwrap();
    assert_eq!(
        output.lua,
        "__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {[\"2\"] = 1});\nx = 1;\n"
    );
}

#[test]
fn test_transpile_keeps_diagnostics() {
    let output = transpile_string("const x = Math.fround(1);", "main.ts", &CompilerOptions::default()).unwrap();
    assert!(output.has_errors());
    assert_eq!(output.diagnostics[0].code, DiagnosticCode::UnsupportedProperty);
    assert_eq!(output.diagnostics[0].file, "main.ts");
}

#[test]
fn test_transpile_warning_only_is_not_an_error() {
    let output = transpile_string("var x = 1;", "main.ts", &CompilerOptions::default()).unwrap();
    assert_eq!(output.diagnostics.len(), 1);
    assert!(!output.has_errors());
}

#[test]
fn test_transpile_parse_error() {
    let result = transpile_string("let = ;", "main.ts", &CompilerOptions::default());
    assert!(matches!(result, Err(TranspileError::Parse(_))));
}

#[test]
fn test_transpile_files() {
    let dir = std::env::temp_dir().join("tslua-core-transpile-files");
    std::fs::create_dir_all(&dir).unwrap();
    let good = dir.join("good.ts");
    std::fs::write(&good, "export const answer = 42;").unwrap();
    let missing = dir.join("missing.ts");
    let _ = std::fs::remove_file(&missing);

    let outputs = transpile_files(&[&good, &missing], &CompilerOptions::default());
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].path, good);
    let lua = &outputs[0].result.as_ref().unwrap().lua;
    assert!(lua.contains("____exports.answer = 42;"));
    assert!(matches!(outputs[1].result, Err(TranspileError::Io(_))));
}

#[test]
fn test_output_file_name() {
    assert_eq!(output_file_name("src/app.ts"), "src/app.lua");
    assert_eq!(output_file_name("view.tsx"), "view.lua");
}
