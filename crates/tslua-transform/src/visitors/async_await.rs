//! `await` and `yield`, both suspending the coroutine the function body runs
//! in.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

/// `await p` → `__TS__Await(p)`.
pub(crate) fn transform_await_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Await(value) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    if !context.function_scope().is_some_and(|scope| scope.is_async) {
        context.diagnose(
            expression.span,
            DiagnosticCode::AwaitMustBeInAsyncFunction,
            "Await can only be used inside async functions",
        );
    }
    let value = context.transform_expression(value)?;
    Ok(Some(
        context
            .transform_lualib_call(LuaLibFeature::Await, vec![value])
            .with_range(range),
    ))
}

/// `yield v` → `coroutine.yield(v)`. The value passed to the next `next`
/// call is what the expression evaluates to.
pub(crate) fn transform_yield_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Yield(value) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    if !context.function_scope().is_some_and(|scope| scope.is_generator) {
        context.diagnose(
            expression.span,
            DiagnosticCode::UnsupportedKind,
            "Yield can only be used inside generator functions",
        );
    }
    let arguments = match value {
        Some(value) => vec![context.transform_expression(value)?],
        None => Vec::new(),
    };
    Ok(Some(
        lua::Expression::call(lua::Expression::path("coroutine.yield"), arguments).with_range(range),
    ))
}
