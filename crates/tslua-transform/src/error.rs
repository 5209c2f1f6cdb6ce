//! Unrecoverable transform failures.

use thiserror::Error;

/// Internal invariant violations. Each aborts the transform of one file;
/// problems with the input program are reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no preceding statements frame is active")]
    NoPrecedingStatementsFrame,

    #[error("expression visitor for {kind} produced no result")]
    EmptyExpressionResult { kind: String },

    #[error("no visitor below the current one for {kind}")]
    NoSuperVisitor { kind: String },

    #[error("scope stack underflow")]
    ScopeUnderflow,
}
