//! Multi-value returns.
//!
//! Calls to functions returning `LuaMultiReturn<[...]>` yield several Lua
//! values. The call visitor wraps them in a table; the sinks below take the
//! values as they are.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::CallExpression;

use crate::context::TransformationContext;
use crate::error::TransformError;

use super::{call, spread};

/// The call node when `expression` is a call returning several values.
pub(crate) fn as_multi_return_call<'a>(
    context: &TransformationContext<'a>,
    expression: &'a ts::Expression,
) -> Option<(&'a ts::Expression, &'a CallExpression)> {
    let inner = expression.skip_outer();
    match &inner.kind {
        ts::ExpressionKind::Call(call) if context.checker.returns_multi(call) => Some((inner, call)),
        _ => None,
    }
}

/// Lower a multi-value call without wrapping it.
///
/// `$multi` only expands in return position; anywhere else it goes through
/// the call visitor, which reports it.
pub(crate) fn transform_multi_value<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    if context.checker.is_multi_helper_call(call) {
        return context.transform_expression(expression);
    }
    call::transform_call_unwrapped(context, expression, call)
}

/// Values of a `return` statement. `return $multi(a, b)` returns `a, b`.
/// Multi-value calls are forwarded only from functions that themselves
/// return several values; elsewhere the call visitor wraps them.
pub(crate) fn transform_return_values<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
) -> Result<Vec<lua::Expression>, TransformError> {
    if let Some((inner, call)) = as_multi_return_call(context, expression) {
        if context.checker.is_multi_helper_call(call) {
            return spread::transform_expression_list(context, &call.arguments, true);
        }
        let forwards = context.function_scope().is_some_and(|scope| scope.multi_return);
        if forwards {
            return Ok(vec![call::transform_call_unwrapped(context, inner, call)?]);
        }
    }
    Ok(vec![context.transform_expression(expression)?])
}
