//! `tslua.toml` loading.
//!
//! Options may sit at the top level or under a `[tslua]` table:
//!
//! ```toml
//! [tslua]
//! luaTarget = "JIT"
//! luaLibImport = "inline"
//! sourceMap = true
//! ```

use std::path::Path;

use rhizome_tslua_transform::CompilerOptions;

use crate::TranspileError;

pub const CONFIG_FILE_NAME: &str = "tslua.toml";

/// Parse compiler options from TOML text. Missing keys keep their defaults.
pub fn parse_config(text: &str) -> Result<CompilerOptions, TranspileError> {
    let mut table: toml::Table = toml::from_str(text)?;
    let options = match table.remove("tslua") {
        Some(section @ toml::Value::Table(_)) => section.try_into()?,
        Some(other) => {
            table.insert("tslua".to_string(), other);
            toml::Value::Table(table).try_into()?
        }
        None => toml::Value::Table(table).try_into()?,
    };
    Ok(options)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CompilerOptions, TranspileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let options = parse_config(&text)?;
    tracing::debug!(path = %path.display(), ?options, "loaded config");
    Ok(options)
}

/// `tslua.toml` in `dir`, or the defaults when there is none.
pub fn load_config_in<P: AsRef<Path>>(dir: P) -> Result<CompilerOptions, TranspileError> {
    let path = dir.as_ref().join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config(path)
    } else {
        Ok(CompilerOptions::default())
    }
}
