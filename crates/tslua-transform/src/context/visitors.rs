//! Per-kind visitor stacks.
//!
//! Each [`SyntaxKind`] maps to a stack of visitors. Dispatch calls the top
//! entry; a visitor may hand the node to the entry below it through
//! [`TransformationContext::super_transform_statement`] or
//! [`TransformationContext::super_transform_expression`].
//!
//! [`TransformationContext::super_transform_statement`]: super::TransformationContext::super_transform_statement
//! [`TransformationContext::super_transform_expression`]: super::TransformationContext::super_transform_expression

use std::collections::HashMap;

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::SyntaxKind;

use super::TransformationContext;
use crate::error::TransformError;

pub type StatementTransform = for<'a> fn(
    &'a ts::Statement,
    &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError>;

pub type ExpressionTransform = for<'a> fn(
    &'a ts::Expression,
    &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError>;

#[derive(Clone, Copy)]
pub enum VisitorFn {
    Statement(StatementTransform),
    Expression(ExpressionTransform),
}

#[derive(Clone, Copy)]
pub struct Visitor {
    pub name: &'static str,
    pub transform: VisitorFn,
}

impl std::fmt::Debug for Visitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visitor").field("name", &self.name).finish()
    }
}

/// Registered visitors, innermost (most recently registered) last.
#[derive(Debug, Default, Clone)]
pub struct VisitorMap {
    entries: HashMap<SyntaxKind, Vec<Visitor>>,
}

impl VisitorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: SyntaxKind, visitor: Visitor) {
        self.entries.entry(kind).or_default().push(visitor);
    }

    pub fn register_statement(
        &mut self,
        kind: SyntaxKind,
        name: &'static str,
        transform: StatementTransform,
    ) {
        self.register(
            kind,
            Visitor {
                name,
                transform: VisitorFn::Statement(transform),
            },
        );
    }

    pub fn register_expression(
        &mut self,
        kind: SyntaxKind,
        name: &'static str,
        transform: ExpressionTransform,
    ) {
        self.register(
            kind,
            Visitor {
                name,
                transform: VisitorFn::Expression(transform),
            },
        );
    }

    /// Visitors for `kind`, bottom of the stack first.
    pub fn stack(&self, kind: SyntaxKind) -> &[Visitor] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn get(&self, kind: SyntaxKind, index: usize) -> Option<&Visitor> {
        self.entries.get(&kind)?.get(index)
    }
}
