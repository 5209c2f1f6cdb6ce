//! TypeScript front end for the Lua transpiler.
//!
//! Uses tree-sitter to parse TypeScript into an owned syntax tree, then
//! binds scopes and answers the type questions lowering needs.

pub mod ast;
mod binder;
mod checker;
mod prelude;
mod reader;
mod types;

pub use ast::*;
pub use binder::{ImportedName, Origin, Symbol, SymbolId, SymbolKind, ThisBinding};
pub use checker::{Checker, CheckerOptions, EnumValue};
pub use prelude::prelude;
pub use reader::{parse, ParseError};
pub use types::{ContextType, FunctionType, Type};

#[cfg(test)]
mod tests;
