//! Prefix operators, `typeof`, `void` and `delete`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::UnaryOperator;

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::access::{self, LValue};
use super::{binary, compound, expression_statement};

pub(crate) fn transform_prefix_unary_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let range = lua_ast::range(expression.span);
    let unary = match &expression.kind {
        ts::ExpressionKind::Update(update) => {
            return Ok(Some(
                compound::transform_prefix_update_expression(context, update)?.with_range(range),
            ));
        }
        ts::ExpressionKind::Unary(unary) => unary,
        _ => return Ok(None),
    };

    let operand = context.transform_expression(&unary.operand)?;
    let lowered = match unary.operator {
        UnaryOperator::Not => lua_ast::not(operand),
        UnaryOperator::Minus => match operand.as_number() {
            Some(value) => lua::Expression::number(-value),
            None => lua::Expression::unary(lua::UnaryOperator::Negate, operand),
        },
        UnaryOperator::Plus => {
            if context.checker.type_of(&unary.operand).is_number() {
                operand
            } else {
                lua::Expression::call(lua::Expression::identifier("tonumber"), vec![operand])
            }
        }
        UnaryOperator::BitwiseNot => binary::transform_bitwise_not(context, operand, expression.span),
        UnaryOperator::TypeOf => context.transform_lualib_call(LuaLibFeature::TypeOf, vec![operand]),
        UnaryOperator::Void => {
            context.add_preceding_statement(discard(operand))?;
            lua::Expression::nil()
        }
        UnaryOperator::Delete => return transform_delete_expression(expression, context),
    };
    Ok(Some(lowered.with_range(range)))
}

/// Statement evaluating a value for its side effects only.
fn discard(value: lua::Expression) -> lua::Statement {
    match value.kind {
        lua::ExpressionKind::Call { .. } | lua::ExpressionKind::MethodCall { .. } => {
            lua::Statement::expression(value)
        }
        _ => lua::Statement::local_one(lua::Identifier::new("____"), Some(value)),
    }
}

pub(crate) fn transform_typeof_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Unary(unary) = &expression.kind else {
        return Ok(None);
    };
    let operand = context.transform_expression(&unary.operand)?;
    Ok(Some(
        context
            .transform_lualib_call(LuaLibFeature::TypeOf, vec![operand])
            .with_range(lua_ast::range(expression.span)),
    ))
}

/// `void e` evaluates `e` and yields `nil`.
pub(crate) fn transform_void_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Unary(unary) = &expression.kind else {
        return Ok(None);
    };
    let statements = expression_statement::transform_expression_to_statements(context, &unary.operand)?;
    context.add_preceding_statements(statements)?;
    Ok(Some(lua::Expression::nil().with_range(lua_ast::range(expression.span))))
}

/// `delete o.p` as a value: `__TS__Delete(o, "p")`, which reports whether the
/// key could be removed.
pub(crate) fn transform_delete_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Unary(unary) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    match delete_target(context, &unary.operand)? {
        Some((table, key)) => Ok(Some(
            context
                .transform_lualib_call(LuaLibFeature::Delete, vec![table, key])
                .with_range(range),
        )),
        None => Ok(Some(lua::Expression::boolean(true).with_range(range))),
    }
}

/// `delete o.p` as a statement: `o.p = nil`.
pub(crate) fn transform_delete_statement<'a>(
    context: &mut TransformationContext<'a>,
    operand: &'a ts::Expression,
    span: ts::Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    match delete_target(context, operand)? {
        Some((table, key)) => Ok(vec![
            lua::Statement::assign_one(lua::Expression::table_index(table, key), lua::Expression::nil())
                .with_range(lua_ast::range(span)),
        ]),
        None => Ok(Vec::new()),
    }
}

/// Table and key removed by `delete`, or `None` after reporting an operand
/// that is not a property.
fn delete_target<'a>(
    context: &mut TransformationContext<'a>,
    operand: &'a ts::Expression,
) -> Result<Option<(lua::Expression, lua::Expression)>, TransformError> {
    let inner = operand.skip_outer();
    if !matches!(
        inner.kind,
        ts::ExpressionKind::PropertyAccess(_) | ts::ExpressionKind::ElementAccess(_)
    ) {
        context.diagnose(
            operand.span,
            DiagnosticCode::InvalidDeleteTarget,
            "The operand of a delete operator must be a property reference",
        );
        return Ok(None);
    }
    match access::transform_lvalue(context, inner, false)? {
        LValue::Index { table, index } => Ok(Some((table, index))),
        LValue::Accessor { name, .. } => {
            context.diagnose(
                operand.span,
                DiagnosticCode::InvalidDeleteTarget,
                format!("Cannot delete accessor property '{}'", name),
            );
            Ok(None)
        }
        LValue::Name(_) => Ok(None),
    }
}
