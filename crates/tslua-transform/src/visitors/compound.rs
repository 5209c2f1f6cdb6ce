//! Compound assignments (`+=`, `??=`, ...) and `++` / `--`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{CompoundOperator, Span};

use crate::context::{TransformationContext, temp_hint};
use crate::error::TransformError;
use crate::lua_ast;

use super::access::{self, LValue};
use super::binary;

/// `target op= value` where the result is not used.
pub(crate) fn transform_compound_assignment_statement<'a>(
    context: &mut TransformationContext<'a>,
    compound: &'a ts::CompoundAssignment,
    span: Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    let range = lua_ast::range(span);
    if is_logical(compound.operator) {
        let lvalue = access::transform_lvalue(context, &compound.left, true)?;
        let (mut statements, value) =
            context.with_preceding_frame(|context| context.transform_expression(&compound.right))?;
        let condition = logical_condition(compound.operator, lvalue.read());
        statements.push(lvalue.write(value));
        return Ok(vec![lua_ast::if_block(condition, statements).with_range(range)]);
    }
    let (lvalue, value) = lower_arithmetic(context, compound, span)?;
    Ok(vec![lvalue.write(value).with_range(range)])
}

/// `target op= value` used as a value.
pub(crate) fn transform_compound_assignment_expression<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    compound: &'a ts::CompoundAssignment,
) -> Result<lua::Expression, TransformError> {
    if is_logical(compound.operator) {
        let lvalue = access::transform_lvalue(context, &compound.left, true)?;
        let (mut statements, value) =
            context.with_preceding_frame(|context| context.transform_expression(&compound.right))?;
        if let LValue::Name(name) = &lvalue {
            let condition = logical_condition(compound.operator, name.clone());
            statements.push(lvalue.write(value));
            context.add_preceding_statement(lua_ast::if_block(condition, statements))?;
            return Ok(name.clone());
        }
        let current = context.create_temp_for_expression(lvalue.read(), &temp_hint(&compound.left))?;
        let condition = logical_condition(compound.operator, current.clone());
        statements.push(lua::Statement::assign_one(current.clone(), value));
        statements.push(lvalue.write(current.clone()));
        context.add_preceding_statement(lua_ast::if_block(condition, statements))?;
        return Ok(current);
    }

    let (lvalue, value) = lower_arithmetic(context, compound, expression.span)?;
    store_result(context, lvalue, value, &compound.left)
}

fn is_logical(operator: CompoundOperator) -> bool {
    matches!(
        operator,
        CompoundOperator::LogicalAnd | CompoundOperator::LogicalOr | CompoundOperator::Coalesce
    )
}

/// When a logical assignment writes its target.
fn logical_condition(operator: CompoundOperator, current: lua::Expression) -> lua::Expression {
    match operator {
        CompoundOperator::LogicalAnd => current,
        CompoundOperator::LogicalOr => lua_ast::not(current),
        _ => lua_ast::is_nil(current),
    }
}

/// The target of `left op= right` and the value to write into it.
fn lower_arithmetic<'a>(
    context: &mut TransformationContext<'a>,
    compound: &'a ts::CompoundAssignment,
    span: Span,
) -> Result<(LValue, lua::Expression), TransformError> {
    let left_type = context.checker.type_of(&compound.left);
    let right_type = context.checker.type_of(&compound.right);
    let lvalue = access::transform_lvalue(context, &compound.left, true)?;
    let (statements, right) =
        context.with_preceding_frame(|context| context.transform_expression(&compound.right))?;
    let current = if statements.is_empty() {
        lvalue.read()
    } else {
        context.create_temp_for_expression(lvalue.read(), &temp_hint(&compound.left))?
    };
    context.add_preceding_statements(statements)?;
    let value = binary::apply_operator(
        context,
        compound.operator.binary_operator(),
        (current, &left_type),
        (right, &right_type),
        span,
    );
    Ok((lvalue, value))
}

/// Write `value` ahead of the current statement and return what the
/// expression evaluates to.
fn store_result(
    context: &mut TransformationContext<'_>,
    lvalue: LValue,
    value: lua::Expression,
    target: &ts::Expression,
) -> Result<lua::Expression, TransformError> {
    if let LValue::Name(name) = &lvalue {
        context.add_preceding_statement(lvalue.write(value))?;
        return Ok(name.clone());
    }
    let temp = context.create_temp_for_expression(value, &temp_hint(target))?;
    context.add_preceding_statement(lvalue.write(temp.clone()))?;
    Ok(temp)
}

fn step(update: &ts::UpdateExpression) -> f64 {
    if update.increment { 1.0 } else { -1.0 }
}

/// `i++` or `--i` where the result is not used.
pub(crate) fn transform_update_statement<'a>(
    context: &mut TransformationContext<'a>,
    update: &'a ts::UpdateExpression,
    span: Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    let lvalue = access::transform_lvalue(context, &update.operand, true)?;
    let value = lua_ast::add_to_numeric_expression(lvalue.read(), step(update));
    Ok(vec![lvalue.write(value).with_range(lua_ast::range(span))])
}

/// `++i` as a value: the updated value.
pub(crate) fn transform_prefix_update_expression<'a>(
    context: &mut TransformationContext<'a>,
    update: &'a ts::UpdateExpression,
) -> Result<lua::Expression, TransformError> {
    let lvalue = access::transform_lvalue(context, &update.operand, true)?;
    let value = lua_ast::add_to_numeric_expression(lvalue.read(), step(update));
    store_result(context, lvalue, value, &update.operand)
}

/// `i++` as a value: the value before the update.
pub(crate) fn transform_postfix_update_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Update(update) = &expression.kind else {
        return Ok(None);
    };
    let lvalue = access::transform_lvalue(context, &update.operand, true)?;
    let old = context.create_temp_for_expression(lvalue.read(), &temp_hint(&update.operand))?;
    let value = lua_ast::add_to_numeric_expression(old.clone(), step(update));
    context.add_preceding_statement(lvalue.write(value).with_range(lua_ast::range(expression.span)))?;
    Ok(Some(old))
}
