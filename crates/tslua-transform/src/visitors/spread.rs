//! Spread elements and ordered expression lists.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::SymbolId;

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;
use crate::walk;

use super::tuple;

/// `...x` in an argument list or array literal.
///
/// Arrays unpack, the rest parameter of the current function forwards as
/// `...` when nothing else can observe it, and other iterables go through
/// `__TS__Spread`.
pub(crate) fn transform_spread_element<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Spread(operand) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);

    if let ts::ExpressionKind::Call(inner) = &operand.skip_outer().kind {
        if context.checker.returns_multi(inner) {
            let lowered = tuple::transform_multi_value(context, operand.skip_outer(), inner)?;
            return Ok(Some(lowered.with_range(range)));
        }
    }

    if is_optimized_rest_spread(context, operand) {
        return Ok(Some(lua::Expression::dots().with_range(range)));
    }

    let ty = context.checker.type_of(operand);
    let value = context.transform_expression(operand)?;
    let lowered = if ty.is_array() {
        lua_ast::create_unpack_call(context, value)
    } else {
        context.transform_lualib_call(LuaLibFeature::Spread, vec![value])
    };
    Ok(Some(lowered.with_range(range)))
}

/// Whether `...operand` can forward the enclosing function's varargs.
///
/// The operand has to be the rest parameter of the innermost function,
/// never assigned, referenced only in spreads of that same function, and
/// the function must not hoist declarations that could capture it. Async
/// functions and generators move their body into a closure without varargs.
fn is_optimized_rest_spread(context: &TransformationContext<'_>, operand: &ts::Expression) -> bool {
    let operand = operand.skip_outer();
    if operand.as_identifier().is_none() {
        return false;
    }
    let Some(symbol) = context.symbol_of(operand.id) else {
        return false;
    };
    let Some(function) = context.checker.rest_parameter_function(symbol) else {
        return false;
    };
    let Some(scope) = context.function_scope() else {
        return false;
    };
    if scope.function != Some(function.id)
        || scope.hoisted_function_count() > 0
        || scope.is_async
        || scope.is_generator
    {
        return false;
    }
    is_rest_only_spread(context, function, symbol)
}

/// Whether every use of the rest parameter `symbol` is a direct spread
/// inside `function`.
pub(crate) fn is_rest_only_spread(
    context: &TransformationContext<'_>,
    function: &ts::Function,
    symbol: SymbolId,
) -> bool {
    if context.checker.is_assigned(symbol) {
        return false;
    }
    walk::collect_function_references(context.checker, function)
        .into_iter()
        .filter(|reference| reference.symbol == symbol)
        .all(|reference| reference.in_spread && reference.function == Some(function.id))
}

/// Lower `expressions` left to right. When a later expression needs helper
/// statements, earlier values that could change are cached first so the
/// statements cannot reorder their evaluation.
pub(crate) fn transform_ordered_expressions<'a>(
    context: &mut TransformationContext<'a>,
    expressions: &'a [ts::Expression],
) -> Result<Vec<lua::Expression>, TransformError> {
    let mut lowered = Vec::with_capacity(expressions.len());
    for expression in expressions {
        lowered.push(context.with_preceding_frame(|context| context.transform_expression(expression))?);
    }
    order_lowered(context, expressions, lowered)
}

pub(crate) fn order_lowered(
    context: &mut TransformationContext<'_>,
    expressions: &[ts::Expression],
    lowered: Vec<(Vec<lua::Statement>, lua::Expression)>,
) -> Result<Vec<lua::Expression>, TransformError> {
    let last_with_statements = lowered.iter().rposition(|(statements, _)| !statements.is_empty());
    let mut result = Vec::with_capacity(lowered.len());
    for (index, (statements, value)) in lowered.into_iter().enumerate() {
        context.add_preceding_statements(statements)?;
        if last_with_statements.is_some_and(|last| index < last) && !is_vararg(&value) {
            result.push(context.move_to_preceding_temp(value, expressions.get(index))?);
        } else {
            result.push(value);
        }
    }
    Ok(result)
}

fn is_vararg(value: &lua::Expression) -> bool {
    matches!(value.kind, lua::ExpressionKind::Dots)
}

/// Lower an argument list.
///
/// A spread anywhere but last is merged with its neighbours through
/// `__TS__ArrayConcat` and unpacked. `unwrap_multi` passes multi-value calls
/// through as value lists rather than wrapping them in tables.
pub(crate) fn transform_expression_list<'a>(
    context: &mut TransformationContext<'a>,
    expressions: &'a [ts::Expression],
    unwrap_multi: bool,
) -> Result<Vec<lua::Expression>, TransformError> {
    let spread_before_end = expressions
        .iter()
        .rev()
        .skip(1)
        .any(|expression| matches!(expression.kind, ts::ExpressionKind::Spread(_)));
    if spread_before_end {
        let concatenated = transform_concat_segments(context, expressions)?;
        return Ok(vec![lua_ast::create_unpack_call(context, concatenated)]);
    }

    let mut lowered = Vec::with_capacity(expressions.len());
    for expression in expressions {
        lowered.push(context.with_preceding_frame(|context| {
            transform_list_element(context, expression, unwrap_multi)
        })?);
    }
    order_lowered(context, expressions, lowered)
}

fn transform_list_element<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    unwrap_multi: bool,
) -> Result<lua::Expression, TransformError> {
    if unwrap_multi {
        if let ts::ExpressionKind::Call(inner) = &expression.skip_outer().kind {
            if context.checker.returns_multi(inner) {
                return tuple::transform_multi_value(context, expression.skip_outer(), inner);
            }
        }
    }
    context.transform_expression(expression)
}

/// Table for an array literal.
pub(crate) fn transform_array_elements<'a>(
    context: &mut TransformationContext<'a>,
    elements: &'a [ts::Expression],
) -> Result<lua::Expression, TransformError> {
    let spread_before_end = elements
        .iter()
        .rev()
        .skip(1)
        .any(|element| matches!(element.kind, ts::ExpressionKind::Spread(_)));
    if spread_before_end {
        return transform_concat_segments(context, elements);
    }
    let values = transform_expression_list(context, elements, false)?;
    Ok(lua::Expression::array(values))
}

/// `__TS__ArrayConcat({a, b}, xs, {c})` for a list with inner spreads.
fn transform_concat_segments<'a>(
    context: &mut TransformationContext<'a>,
    expressions: &'a [ts::Expression],
) -> Result<lua::Expression, TransformError> {
    let mut lowered = Vec::with_capacity(expressions.len());
    for expression in expressions {
        lowered.push(context.with_preceding_frame(|context| {
            match &expression.kind {
                ts::ExpressionKind::Spread(operand) => {
                    let ty = context.checker.type_of(operand);
                    let value = context.transform_expression(operand)?;
                    if ty.is_array() {
                        Ok(value)
                    } else {
                        let spread = context.transform_lualib_call(LuaLibFeature::Spread, vec![value]);
                        Ok(lua::Expression::array(vec![spread]))
                    }
                }
                _ => context.transform_expression(expression),
            }
        })?);
    }
    let values = order_lowered(context, expressions, lowered)?;

    let mut segments: Vec<lua::Expression> = Vec::new();
    let mut pending: Vec<lua::Expression> = Vec::new();
    for (expression, value) in expressions.iter().zip(values) {
        if matches!(expression.kind, ts::ExpressionKind::Spread(_)) {
            if !pending.is_empty() {
                segments.push(lua::Expression::array(std::mem::take(&mut pending)));
            }
            segments.push(value);
        } else {
            pending.push(value);
        }
    }
    if !pending.is_empty() {
        segments.push(lua::Expression::array(pending));
    }
    Ok(context.transform_lualib_call(LuaLibFeature::ArrayConcat, segments))
}
