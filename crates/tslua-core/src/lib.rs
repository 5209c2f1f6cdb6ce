//! TypeScript to Lua transpiler driver.
//!
//! Runs the pipeline for one file at a time: parse, check, lower with the
//! standard visitors, then print with the requested lualib import and source
//! map settings. Files share nothing but the options, so callers are free to
//! transpile them on separate threads.

mod config;
mod error;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rhizome_tslua_ast::Block;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_printer::{PrintOptions, print_lua};
use rhizome_tslua_syntax_typescript::{Checker, CheckerOptions, parse};
use rhizome_tslua_transform::{Diagnostic, standard_visitors, transform_file};

pub use config::{CONFIG_FILE_NAME, load_config, load_config_in, parse_config};
pub use error::TranspileError;
pub use rhizome_tslua_printer::output_file_name;
pub use rhizome_tslua_transform::{CompilerOptions, DiagnosticCategory, DiagnosticCode, LuaTarget};

/// Everything produced for one source file.
#[derive(Debug, Clone)]
pub struct TranspileOutput {
    pub lua: String,
    pub source_map: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub used_features: BTreeSet<LuaLibFeature>,
    pub lua_ast: Block,
}

impl TranspileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Result for one file of [`transpile_files`].
#[derive(Debug)]
pub struct FileOutput {
    pub path: PathBuf,
    pub result: Result<TranspileOutput, TranspileError>,
}

/// The printer's share of the compiler options.
pub fn print_options(options: &CompilerOptions) -> PrintOptions {
    PrintOptions {
        lua_lib_import: options.lua_lib_import,
        no_header: options.no_header,
        source_map: options.source_map,
        inline_source_map: options.inline_source_map,
        source_map_traceback: options.source_map_traceback,
    }
}

/// Transpile one source text. Diagnostics do not fail the call; they are
/// returned alongside the output.
pub fn transpile_string(
    source: &str,
    file_name: &str,
    options: &CompilerOptions,
) -> Result<TranspileOutput, TranspileError> {
    let file = parse(source, file_name)?;
    let checker = Checker::new(
        &file,
        CheckerOptions {
            no_implicit_self: options.no_implicit_self,
        },
    )?;
    let transformed = transform_file(&file, &checker, options, standard_visitors())?;
    for diagnostic in &transformed.diagnostics {
        tracing::warn!("{}", diagnostic);
    }

    let printed = print_lua(
        &transformed.block,
        file_name,
        &transformed.used_features,
        &print_options(options),
    )?;
    tracing::debug!(
        file = file_name,
        bytes = printed.code.len(),
        features = transformed.used_features.len(),
        "transpiled"
    );

    Ok(TranspileOutput {
        lua: printed.code,
        source_map: printed.source_map,
        diagnostics: transformed.diagnostics,
        used_features: transformed.used_features,
        lua_ast: transformed.block,
    })
}

/// Read and transpile each file. One file failing does not stop the rest.
pub fn transpile_files<P: AsRef<Path>>(paths: &[P], options: &CompilerOptions) -> Vec<FileOutput> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            FileOutput {
                path: path.to_path_buf(),
                result: transpile_path(path, options),
            }
        })
        .collect()
}

/// Read and transpile a single file, named after its path.
pub fn transpile_path(path: &Path, options: &CompilerOptions) -> Result<TranspileOutput, TranspileError> {
    let source = std::fs::read_to_string(path)?;
    transpile_string(&source, &path.to_string_lossy(), options)
}

#[cfg(test)]
mod tests;
