//! Ambient declarations for the Lua standard library.

use std::sync::OnceLock;

use crate::ast::SourceFile;
use crate::reader::{parse, ParseError};

const PRELUDE_SOURCE: &str = include_str!("prelude.d.ts");

/// Parsed prelude, shared by every checker.
pub fn prelude() -> Result<&'static SourceFile, ParseError> {
    static PRELUDE: OnceLock<Result<SourceFile, ParseError>> = OnceLock::new();
    PRELUDE
        .get_or_init(|| parse(PRELUDE_SOURCE, "prelude.d.ts"))
        .as_ref()
        .map_err(Clone::clone)
}
