//! Lowering of checked TypeScript files into Lua ASTs.
//!
//! A [`TransformationContext`] walks one source file, dispatching every
//! statement and expression to the visitor registered for its syntax kind.
//! The result is a Lua block plus the diagnostics found on the way and the
//! lualib features the output calls into.

mod builtins;
mod context;
mod diagnostics;
mod error;
mod lua_ast;
mod options;
mod visitors;
mod walk;

use std::collections::BTreeSet;

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript::{Checker, SourceFile};

pub use context::{
    ClassFrame, ExpressionTransform, FunctionDefinition, Scope, ScopeType, StatementTransform,
    TransformationContext, Visitor, VisitorFn, VisitorMap, temp_hint,
};
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCode};
pub use error::TransformError;
pub use options::{CompilerOptions, LuaTarget};
pub use visitors::standard_visitors;

/// Lowered file.
#[derive(Debug)]
pub struct TransformOutput {
    pub block: lua::Block,
    pub diagnostics: Vec<Diagnostic>,
    pub used_features: BTreeSet<LuaLibFeature>,
}

/// Lower `file` with `visitors`, usually [`standard_visitors`] or a map that
/// layers overrides on top of them.
pub fn transform_file<'a>(
    file: &'a SourceFile,
    checker: &'a Checker<'a>,
    options: &'a CompilerOptions,
    visitors: &'a VisitorMap,
) -> Result<TransformOutput, TransformError> {
    tracing::debug!(file = %file.file_name, module = file.is_module, "transforming file");
    let mut context = TransformationContext::new(file, checker, options, visitors);
    let statements = visitors::transform_source_file(&mut context)?;
    let (diagnostics, used_features) = context.into_parts();
    tracing::debug!(
        file = %file.file_name,
        diagnostics = diagnostics.len(),
        features = used_features.len(),
        "transformed file"
    );
    Ok(TransformOutput {
        block: lua::Block::new(statements),
        diagnostics,
        used_features,
    })
}

#[cfg(test)]
mod tests;
