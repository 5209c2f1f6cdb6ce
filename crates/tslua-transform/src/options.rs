//! Compiler options shared by every file of a build.

use std::fmt;
use std::str::FromStr;

use rhizome_tslua_lualib::LuaLibImportKind;
use serde::{Deserialize, Serialize};

/// Lua dialect the output must run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LuaTarget {
    /// Code that runs on every supported version.
    #[default]
    #[serde(rename = "universal")]
    Universal,
    #[serde(rename = "5.1")]
    Lua51,
    #[serde(rename = "5.2")]
    Lua52,
    #[serde(rename = "5.3")]
    Lua53,
    #[serde(rename = "5.4")]
    Lua54,
    #[serde(rename = "JIT")]
    LuaJit,
}

impl LuaTarget {
    /// Whether `goto` and labels exist.
    pub fn supports_goto(self) -> bool {
        !matches!(self, LuaTarget::Universal | LuaTarget::Lua51)
    }

    /// Whether `debug.getinfo(f).nparams` exists.
    pub fn supports_nparams(self) -> bool {
        !matches!(self, LuaTarget::Universal | LuaTarget::Lua51)
    }
}

impl fmt::Display for LuaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LuaTarget::Universal => "universal",
            LuaTarget::Lua51 => "5.1",
            LuaTarget::Lua52 => "5.2",
            LuaTarget::Lua53 => "5.3",
            LuaTarget::Lua54 => "5.4",
            LuaTarget::LuaJit => "JIT",
        };
        f.write_str(name)
    }
}

impl FromStr for LuaTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "universal" => Ok(LuaTarget::Universal),
            "5.1" => Ok(LuaTarget::Lua51),
            "5.2" => Ok(LuaTarget::Lua52),
            "5.3" => Ok(LuaTarget::Lua53),
            "5.4" => Ok(LuaTarget::Lua54),
            "JIT" | "jit" => Ok(LuaTarget::LuaJit),
            other => Err(format!("unknown lua target: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub lua_target: LuaTarget,
    pub lua_lib_import: LuaLibImportKind,
    pub no_header: bool,
    pub source_map: bool,
    pub inline_source_map: bool,
    pub source_map_traceback: bool,
    /// Report references before declaration instead of hoisting.
    pub no_hoisting: bool,
    /// Free functions take no `self` parameter.
    pub no_implicit_self: bool,
    /// Plain calls to functions taking `self` pass `nil` rather than `_G`.
    pub strict: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            lua_target: LuaTarget::default(),
            lua_lib_import: LuaLibImportKind::default(),
            no_header: false,
            source_map: false,
            inline_source_map: false,
            source_map_traceback: false,
            no_hoisting: false,
            no_implicit_self: false,
            strict: true,
        }
    }
}
