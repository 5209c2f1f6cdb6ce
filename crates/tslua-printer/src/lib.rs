//! Lua source printer.
//!
//! Renders a lowered [`Block`] to text, with the generated-file header, the
//! lualib import, an optional v3 source map and the stack-traceback table.

mod printer;
mod source_map;
mod traceback;

use std::collections::BTreeSet;

use rhizome_tslua_ast::Block;
use rhizome_tslua_lualib::{LuaLibFeature, LuaLibImportKind, load_features};
use serde::{Deserialize, Serialize};

pub use printer::{LuaPrinter, escape_string, format_number};
pub use source_map::{Mapping, SourceMapGenerator, vlq};
pub use traceback::{TRACEBACK_PLACEHOLDER, traceback_call, traceback_table};

pub const HEADER: &str = "--[[ Generated with tslua ]]";

/// Printer-relevant compiler options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintOptions {
    pub lua_lib_import: LuaLibImportKind,
    pub no_header: bool,
    pub source_map: bool,
    pub inline_source_map: bool,
    pub source_map_traceback: bool,
}

#[derive(Debug, Clone)]
pub struct PrintOutput {
    pub code: String,
    /// Serialized source map, when requested.
    pub source_map: Option<String>,
    pub mappings: Vec<Mapping>,
}

/// Lua file name for a TypeScript source file name.
pub fn output_file_name(source_file: &str) -> String {
    let stem = [".tsx", ".ts"]
        .iter()
        .find_map(|extension| source_file.strip_suffix(extension))
        .unwrap_or(source_file);
    format!("{}.lua", stem)
}

/// Print `block`, lowered from `source_file`, which uses `features`.
pub fn print_lua(
    block: &Block,
    source_file: &str,
    features: &BTreeSet<LuaLibFeature>,
    options: &PrintOptions,
) -> Result<PrintOutput, serde_json::Error> {
    let mut features = features.clone();
    if options.source_map_traceback {
        features.insert(LuaLibFeature::SourceMapTraceBack);
    }

    let mut printer = LuaPrinter::new();
    if !options.no_header {
        printer.write(HEADER);
        printer.write("\n");
    }
    print_lualib_import(&mut printer, &features, options.lua_lib_import);
    // Precedes the body, which may end in a top-level `return`.
    if options.source_map_traceback {
        printer.write(TRACEBACK_PLACEHOLDER);
        printer.write("\n");
    }
    printer.print_statements(&block.statements);
    let (mut code, mappings) = printer.finish();

    if options.source_map_traceback {
        let call = traceback_call(&traceback_table(&mappings));
        code = code.replace(TRACEBACK_PLACEHOLDER, &call);
    }

    let file = output_file_name(source_file);
    let mut source_map = None;
    if options.source_map || options.inline_source_map {
        let mut generator = SourceMapGenerator::new(file);
        let source = generator.add_source(source_file.to_string());
        for mapping in &mappings {
            generator.add_mapping(mapping.clone(), source);
        }
        let json = generator.to_json()?;
        if options.inline_source_map {
            code.push_str("\n--# sourceMappingURL=data:application/json;base64,");
            code.push_str(&source_map::base64_encode(json.as_bytes()));
            code.push('\n');
        }
        if options.source_map {
            source_map = Some(json);
        }
    }

    tracing::debug!(
        file = source_file,
        lines = code.lines().count(),
        mappings = mappings.len(),
        "printed lua"
    );
    Ok(PrintOutput {
        code,
        source_map,
        mappings,
    })
}

fn print_lualib_import(printer: &mut LuaPrinter, features: &BTreeSet<LuaLibFeature>, kind: LuaLibImportKind) {
    let require = match kind {
        LuaLibImportKind::Require => !features.is_empty(),
        LuaLibImportKind::Always => true,
        LuaLibImportKind::Inline => {
            if !features.is_empty() {
                printer.write("-- Lua Library inline imports\n");
                printer.write(&load_features(features));
                printer.write("-- End of Lua Library inline imports\n");
            }
            false
        }
        LuaLibImportKind::None => false,
    };
    if require {
        printer.write("require(\"lualib_bundle\");\n");
    }
}

#[cfg(test)]
mod tests;
