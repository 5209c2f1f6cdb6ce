//! Plain `=` assignments, as statements and as values.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::PatternKind;

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;

use super::access::{self, LValue};
use super::{call, destructuring};

/// `target = value` where the result is not used.
pub(crate) fn transform_assignment_statement<'a>(
    context: &mut TransformationContext<'a>,
    assignment: &'a ts::Assignment,
    span: ts::Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    let range = lua_ast::range(span);
    let left = &*assignment.left;
    let right = &*assignment.right;

    if matches!(left.kind, PatternKind::Array(_) | PatternKind::Object(_)) {
        if let Some(statement) = transform_multiple_assignment(context, left, right)? {
            return Ok(vec![statement.with_range(range)]);
        }
        let value = context.transform_expression(right)?;
        let value = context.move_to_preceding_temp(value, Some(right))?;
        return destructuring::transform_assignment_destructuring(context, left, value);
    }

    check_conversion(context, left, right);
    let (lvalue, value) = transform_target_and_value(context, left, right)?;
    Ok(vec![lvalue.write(value).with_range(range)])
}

/// `target = value` whose result is used, such as `a = b = 0`.
pub(crate) fn transform_assignment_expression<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    assignment: &'a ts::Assignment,
) -> Result<lua::Expression, TransformError> {
    let range = lua_ast::range(expression.span);
    let left = &*assignment.left;
    let right = &*assignment.right;

    if matches!(left.kind, PatternKind::Array(_) | PatternKind::Object(_)) {
        let value = context.transform_expression(right)?;
        let value = context.create_temp_for_expression(value, "assignment")?;
        let statements = destructuring::transform_assignment_destructuring(context, left, value.clone())?;
        context.add_preceding_statements(statements)?;
        return Ok(value.with_range(range));
    }

    check_conversion(context, left, right);
    let (lvalue, value) = transform_target_and_value(context, left, right)?;
    let value = context.move_to_preceding_temp(value, Some(right))?;
    context.add_preceding_statement(lvalue.write(value.clone()).with_range(range))?;
    Ok(value)
}

/// Lower the target first, then the value. When the value needs helper
/// statements, the target's parts are cached ahead of them so the source's
/// evaluation order holds.
fn transform_target_and_value<'a>(
    context: &mut TransformationContext<'a>,
    left: &'a ts::Pattern,
    right: &'a ts::Expression,
) -> Result<(LValue, lua::Expression), TransformError> {
    let lvalue = access::transform_pattern_lvalue(context, left, false)?;
    let (statements, value) =
        context.with_preceding_frame(|context| context.transform_expression(right))?;
    if statements.is_empty() {
        return Ok((lvalue, value));
    }
    let lvalue = lvalue.cache(context)?;
    context.add_preceding_statements(statements)?;
    Ok((lvalue, value))
}

/// `[a, b] = [b, a]` as one Lua multiple assignment.
fn transform_multiple_assignment<'a>(
    context: &mut TransformationContext<'a>,
    left: &'a ts::Pattern,
    right: &'a ts::Expression,
) -> Result<Option<lua::Statement>, TransformError> {
    let Some(targets) = destructuring::simple_array_targets(left) else {
        return Ok(None);
    };
    let (statements, lowered) = context.with_preceding_frame(|context| {
        let mut lvalues = Vec::with_capacity(targets.len());
        for target in &targets {
            lvalues.push(access::transform_pattern_lvalue(context, target, false)?);
        }
        Ok(lvalues)
    })?;
    let Some(lvalues) = lowered
        .iter()
        .map(LValue::as_assignment_target)
        .collect::<Option<Vec<_>>>()
    else {
        return Ok(None);
    };
    // Target helpers would run twice if the generic path lowered them again.
    if !statements.is_empty() {
        return Ok(None);
    }
    let Some(values) = destructuring::transform_values_in_place(context, targets.len(), right)? else {
        return Ok(None);
    };
    Ok(Some(lua::Statement::assign(lvalues, values)))
}

/// Report assigning a function to a target expecting the other `self`
/// convention.
fn check_conversion(context: &mut TransformationContext<'_>, left: &ts::Pattern, right: &ts::Expression) {
    let to = match &left.kind {
        PatternKind::Identifier(_) => match context.symbol_of(left.id) {
            Some(symbol) => context.checker.type_of_symbol(symbol),
            None => return,
        },
        PatternKind::Expression(target) => context.checker.type_of(target),
        _ => return,
    };
    let from = context.checker.type_of(right);
    call::validate_function_conversion(context, right.span, &from, &to);
}
