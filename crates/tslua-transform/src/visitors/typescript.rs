//! Type-only syntax, which produces no Lua.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;

use crate::context::TransformationContext;
use crate::error::TransformError;

/// Interfaces and type aliases are erased.
pub(crate) fn transform_type_declaration<'a>(
    _statement: &'a ts::Statement,
    _context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    Ok(Vec::new())
}

/// Parentheses, `as`, `!` and `satisfies` lower to their operand. The
/// printer adds back the parentheses precedence needs.
pub(crate) fn transform_transparent_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    match &expression.kind {
        ts::ExpressionKind::Parenthesized(inner) | ts::ExpressionKind::Assertion(inner, _) => {
            context.transform_expression(inner).map(Some)
        }
        _ => Ok(None),
    }
}
