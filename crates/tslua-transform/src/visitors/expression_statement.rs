//! Expressions evaluated for their side effects.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::UnaryOperator;

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;

use super::{assignment, call, compound, unary};

pub(crate) fn transform_expression_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Expression(expression) = &statement.kind else {
        return Ok(Vec::new());
    };
    transform_expression_to_statements(context, expression)
}

/// Lower `expression` when its value is discarded.
///
/// Assignments and updates write in place, multi-value calls are not
/// wrapped, and pure values produce nothing.
pub(crate) fn transform_expression_to_statements<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    let range = lua_ast::range(expression.span);
    let inner = expression.skip_outer();
    match &inner.kind {
        ts::ExpressionKind::Assignment(assign) => {
            return assignment::transform_assignment_statement(context, assign, inner.span);
        }
        ts::ExpressionKind::CompoundAssignment(compound) => {
            return compound::transform_compound_assignment_statement(context, compound, inner.span);
        }
        ts::ExpressionKind::Update(update) => {
            return compound::transform_update_statement(context, update, inner.span);
        }
        ts::ExpressionKind::Unary(operation) if operation.operator == UnaryOperator::Delete => {
            return unary::transform_delete_statement(context, &operation.operand, inner.span);
        }
        ts::ExpressionKind::Unary(operation) if operation.operator == UnaryOperator::Void => {
            return transform_expression_to_statements(context, &operation.operand);
        }
        ts::ExpressionKind::Sequence(items) => {
            let mut statements = Vec::new();
            for item in items {
                let (preceding, lowered) = context
                    .with_preceding_frame(|context| transform_expression_to_statements(context, item))?;
                statements.extend(preceding);
                statements.extend(lowered);
            }
            return Ok(statements);
        }
        ts::ExpressionKind::Call(call_expression)
            if !call_expression.optional
                && context.checker.returns_multi(call_expression)
                && !context.checker.is_multi_helper_call(call_expression) =>
        {
            let value = call::transform_call_unwrapped(context, inner, call_expression)?;
            return Ok(vec![lua::Statement::expression(value).with_range(range)]);
        }
        _ => {}
    }

    let value = context.transform_expression(expression)?;
    let value = lua_ast::unwrap_parentheses(value);
    if is_call(&value) {
        return Ok(vec![lua::Statement::expression(value).with_range(range)]);
    }
    if is_pure(&value) {
        return Ok(Vec::new());
    }
    Ok(vec![
        lua::Statement::local_one(lua::Identifier::new("____"), Some(value)).with_range(range),
    ])
}

fn is_call(value: &lua::Expression) -> bool {
    matches!(
        value.kind,
        lua::ExpressionKind::Call { .. } | lua::ExpressionKind::MethodCall { .. }
    )
}

/// Values whose evaluation has no effect.
fn is_pure(value: &lua::Expression) -> bool {
    match &value.kind {
        lua::ExpressionKind::Nil
        | lua::ExpressionKind::Boolean(_)
        | lua::ExpressionKind::Number(_)
        | lua::ExpressionKind::String(_)
        | lua::ExpressionKind::Identifier(_)
        | lua::ExpressionKind::Function(_) => true,
        lua::ExpressionKind::Unary {
            operator: lua::UnaryOperator::Length,
            operand,
        } => operand.as_identifier().is_some(),
        _ => false,
    }
}
