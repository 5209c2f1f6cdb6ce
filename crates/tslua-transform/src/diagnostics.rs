//! Recoverable problems found while lowering a file.

use std::fmt;

use rhizome_tslua_syntax_typescript::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => f.write_str("error"),
            DiagnosticCategory::Warning => f.write_str("warning"),
        }
    }
}

/// Catalog of diagnostics the transformer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    UnsupportedKind = 1001,
    UnsupportedProperty = 1002,
    UnsupportedForTarget = 1003,
    ForbiddenForIn = 1004,
    UnsupportedAccessorInObjectLiteral = 1005,
    InvalidMultiFunctionUse = 1006,
    ReferencedBeforeDeclaration = 1007,
    UnsupportedVarDeclaration = 1008,
    HeterogeneousEnum = 1009,
    InvalidEnumMember = 1010,
    AwaitMustBeInAsyncFunction = 1011,
    InvalidIdentifierName = 1012,
    UnsupportedSelfFunctionConversion = 1013,
    UnsupportedNoSelfFunctionConversion = 1014,
    InvalidDeleteTarget = 1015,
    InvalidAssignmentTarget = 1016,
    UnsupportedObjectDestructuringInForOf = 1017,
    UnsupportedLabel = 1018,
    UnsupportedNamespace = 1019,
}

impl DiagnosticCode {
    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn category(self) -> DiagnosticCategory {
        match self {
            DiagnosticCode::UnsupportedVarDeclaration => DiagnosticCategory::Warning,
            _ => DiagnosticCategory::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    /// Byte offset of the offending node.
    pub start: u32,
    pub length: u32,
    /// 0-based line of `start`.
    pub line: u32,
    /// 0-based column of `start`.
    pub column: u32,
    pub message: String,
    pub category: DiagnosticCategory,
    pub code: DiagnosticCode,
}

impl Diagnostic {
    pub fn new(file: &str, span: Span, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            start: span.start,
            length: span.len(),
            line: span.line,
            column: span.column,
            message: message.into(),
            category: code.category(),
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} - {} TL{}: {}",
            self.file,
            self.line + 1,
            self.column + 1,
            self.category,
            self.code.number(),
            self.message
        )
    }
}
