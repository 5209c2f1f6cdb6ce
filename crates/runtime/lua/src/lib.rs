//! LuaJIT runtime for transpiled TypeScript.
//!
//! Transpiled files `require("lualib_bundle")`, so every runtime created
//! here preloads the bundle under that name.

use mlua::{Lua, LuaSerdeExt, Result as LuaResult, Table, Value};
use rhizome_tslua_core::{CompilerOptions, TranspileError, transpile_string};
use rhizome_tslua_transform::Diagnostic;
use thiserror::Error;

/// Chunk name used for sources run through [`execute_ts`].
pub const MAIN_FILE: &str = "main.ts";

/// Errors that can occur during execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("transpile error: {0}")]
    Transpile(#[from] TranspileError),

    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Create a LuaJIT state with `lualib_bundle` available to `require`.
pub fn create_runtime() -> LuaResult<Lua> {
    let lua = Lua::new();
    let bundle = lua
        .load(rhizome_tslua_lualib::bundle())
        .set_name("lualib_bundle")
        .into_function()?;
    let package: Table = lua.globals().get("package")?;
    let preload: Table = package.get("preload")?;
    preload.set("lualib_bundle", bundle)?;
    Ok(lua)
}

/// Run a Lua chunk in a fresh runtime and convert its first return value.
pub fn execute(code: &str) -> Result<serde_json::Value, ExecutionError> {
    let lua = create_runtime()?;
    execute_in(&lua, code)
}

/// Run a Lua chunk in an existing runtime.
pub fn execute_in(lua: &Lua, code: &str) -> Result<serde_json::Value, ExecutionError> {
    let value: Value = lua.load(code).set_name(MAIN_FILE).eval()?;
    Ok(lua.from_value(value)?)
}

/// Transpile `source` and run it. Error diagnostics fail before anything
/// executes; warnings do not.
pub fn execute_ts(source: &str, options: &CompilerOptions) -> Result<serde_json::Value, ExecutionError> {
    let output = transpile_string(source, MAIN_FILE, options)?;
    let errors: Vec<Diagnostic> = output
        .diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();
    if !errors.is_empty() {
        return Err(ExecutionError::Diagnostics(errors));
    }
    tracing::trace!(lua = %output.lua, "executing");
    execute(&output.lua)
}

#[cfg(test)]
mod tests;
