//! Binary operators, logical short-circuiting and comma sequences.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator as LuaOperator;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{BinaryOperator, Span, Type, UnaryOperator};

use crate::context::{TransformationContext, temp_hint};
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;
use crate::options::LuaTarget;

use super::{access, assignment, compound, expression_statement};

pub(crate) fn transform_binary_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let range = lua_ast::range(expression.span);
    let lowered = match &expression.kind {
        ts::ExpressionKind::Assignment(assignment) => {
            assignment::transform_assignment_expression(context, expression, assignment)?
        }
        ts::ExpressionKind::CompoundAssignment(compound) => {
            compound::transform_compound_assignment_expression(context, expression, compound)?
        }
        ts::ExpressionKind::Binary(binary) => transform_binary(context, expression, binary)?,
        _ => return Ok(None),
    };
    Ok(Some(lowered.with_range(range)))
}

fn transform_binary<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    binary: &'a ts::BinaryExpression,
) -> Result<lua::Expression, TransformError> {
    let operator = binary.operator;
    if operator.is_logical() {
        return transform_logical(context, binary);
    }
    if is_equality(operator) {
        if let Some(comparison) = transform_typeof_comparison(context, binary)? {
            return Ok(comparison);
        }
    }

    match operator {
        BinaryOperator::In => {
            let object_type = context.checker.type_of(&binary.right);
            let (key, object) = transform_operands(context, &binary.left, &binary.right)?;
            let key = access::adjust_index(context, &object_type, &binary.left, key);
            Ok(lua_ast::is_not_nil(lua::Expression::table_index(object, key)))
        }
        BinaryOperator::InstanceOf => {
            let (object, class) = transform_operands(context, &binary.left, &binary.right)?;
            Ok(context.transform_lualib_call(LuaLibFeature::InstanceOf, vec![object, class]))
        }
        _ => {
            let left_type = context.checker.type_of(&binary.left);
            let right_type = context.checker.type_of(&binary.right);
            let (left, right) = transform_operands(context, &binary.left, &binary.right)?;
            Ok(apply_operator(
                context,
                operator,
                (left, &left_type),
                (right, &right_type),
                expression.span,
            ))
        }
    }
}

fn is_equality(operator: BinaryOperator) -> bool {
    matches!(
        operator,
        BinaryOperator::Equal
            | BinaryOperator::StrictEqual
            | BinaryOperator::NotEqual
            | BinaryOperator::StrictNotEqual
    )
}

/// Lower both operands in order, caching the left one when the right one
/// needs helper statements.
pub(crate) fn transform_operands<'a>(
    context: &mut TransformationContext<'a>,
    left: &'a ts::Expression,
    right: &'a ts::Expression,
) -> Result<(lua::Expression, lua::Expression), TransformError> {
    let left_value = context.transform_expression(left)?;
    let (statements, right_value) =
        context.with_preceding_frame(|context| context.transform_expression(right))?;
    let left_value = if statements.is_empty() {
        left_value
    } else {
        context.move_to_preceding_temp(left_value, Some(left))?
    };
    context.add_preceding_statements(statements)?;
    Ok((left_value, right_value))
}

/// Combine two lowered operands with a non-short-circuiting operator.
pub(crate) fn apply_operator(
    context: &mut TransformationContext<'_>,
    operator: BinaryOperator,
    (left, left_type): (lua::Expression, &Type),
    (right, right_type): (lua::Expression, &Type),
    span: Span,
) -> lua::Expression {
    let lua_operator = match operator {
        BinaryOperator::Add if left_type.is_string() || right_type.is_string() => {
            return lua::Expression::binary(
                lua_ast::wrap_in_to_string(left, left_type),
                LuaOperator::Concat,
                lua_ast::wrap_in_to_string(right, right_type),
            );
        }
        BinaryOperator::Add => LuaOperator::Add,
        BinaryOperator::Sub => LuaOperator::Sub,
        BinaryOperator::Mul => LuaOperator::Mul,
        BinaryOperator::Div => LuaOperator::Div,
        BinaryOperator::Mod => LuaOperator::Mod,
        BinaryOperator::Pow => LuaOperator::Pow,
        BinaryOperator::Equal | BinaryOperator::StrictEqual => LuaOperator::Eq,
        BinaryOperator::NotEqual | BinaryOperator::StrictNotEqual => LuaOperator::Ne,
        BinaryOperator::Less => LuaOperator::Lt,
        BinaryOperator::LessEqual => LuaOperator::Le,
        BinaryOperator::Greater => LuaOperator::Gt,
        BinaryOperator::GreaterEqual => LuaOperator::Ge,
        BinaryOperator::LogicalAnd => LuaOperator::And,
        BinaryOperator::LogicalOr | BinaryOperator::Coalesce => LuaOperator::Or,
        BinaryOperator::In => {
            return lua_ast::is_not_nil(lua::Expression::table_index(right, left));
        }
        BinaryOperator::InstanceOf => {
            return context.transform_lualib_call(LuaLibFeature::InstanceOf, vec![left, right]);
        }
        BinaryOperator::BitwiseAnd
        | BinaryOperator::BitwiseOr
        | BinaryOperator::BitwiseXor
        | BinaryOperator::ShiftLeft
        | BinaryOperator::ShiftRight
        | BinaryOperator::UnsignedShiftRight => {
            return transform_bitwise(context, operator, left, right, span);
        }
    };
    lua::Expression::binary(left, lua_operator, right)
}

/// Bitwise operators through `bit` on LuaJIT, `bit32` on 5.2 and the native
/// operators from 5.3 on.
fn transform_bitwise(
    context: &mut TransformationContext<'_>,
    operator: BinaryOperator,
    left: lua::Expression,
    right: lua::Expression,
    span: Span,
) -> lua::Expression {
    let target = context.options.lua_target;
    match target {
        LuaTarget::LuaJit | LuaTarget::Lua52 => {
            let library = if target == LuaTarget::LuaJit { "bit" } else { "bit32" };
            let function = match operator {
                BinaryOperator::BitwiseOr => "bor",
                BinaryOperator::BitwiseXor => "bxor",
                BinaryOperator::ShiftLeft => "lshift",
                BinaryOperator::ShiftRight => "arshift",
                BinaryOperator::UnsignedShiftRight => "rshift",
                _ => "band",
            };
            lua::Expression::call(
                lua::Expression::path(&format!("{}.{}", library, function)),
                vec![left, right],
            )
        }
        LuaTarget::Lua53 | LuaTarget::Lua54 => {
            if operator == BinaryOperator::ShiftRight {
                context.diagnose(
                    span,
                    DiagnosticCode::UnsupportedForTarget,
                    format!(
                        "Arithmetic right shift is not supported for target Lua {}; use `>>>` instead",
                        target
                    ),
                );
            }
            lua::Expression::binary(left, native_bitwise(operator), right)
        }
        LuaTarget::Universal | LuaTarget::Lua51 => {
            context.diagnose(
                span,
                DiagnosticCode::UnsupportedForTarget,
                format!("Bitwise operations are not supported for target Lua {}", target),
            );
            lua::Expression::binary(left, native_bitwise(operator), right)
        }
    }
}

fn native_bitwise(operator: BinaryOperator) -> LuaOperator {
    match operator {
        BinaryOperator::BitwiseOr => LuaOperator::BitwiseOr,
        BinaryOperator::BitwiseXor => LuaOperator::BitwiseXor,
        BinaryOperator::ShiftLeft => LuaOperator::ShiftLeft,
        BinaryOperator::ShiftRight | BinaryOperator::UnsignedShiftRight => LuaOperator::ShiftRight,
        _ => LuaOperator::BitwiseAnd,
    }
}

/// `~x` with the same per-target rules as the binary bitwise operators.
pub(crate) fn transform_bitwise_not(
    context: &mut TransformationContext<'_>,
    operand: lua::Expression,
    span: Span,
) -> lua::Expression {
    let target = context.options.lua_target;
    match target {
        LuaTarget::LuaJit => lua::Expression::call(lua::Expression::path("bit.bnot"), vec![operand]),
        LuaTarget::Lua52 => lua::Expression::call(lua::Expression::path("bit32.bnot"), vec![operand]),
        LuaTarget::Lua53 | LuaTarget::Lua54 => {
            lua::Expression::unary(lua::UnaryOperator::BitwiseNot, operand)
        }
        LuaTarget::Universal | LuaTarget::Lua51 => {
            context.diagnose(
                span,
                DiagnosticCode::UnsupportedForTarget,
                format!("Bitwise operations are not supported for target Lua {}", target),
            );
            lua::Expression::unary(lua::UnaryOperator::BitwiseNot, operand)
        }
    }
}

/// `a && b`, `a || b` and `a ?? b`.
///
/// They map to `and` / `or` unless the right side needs helper statements,
/// which must only run when it is evaluated, or `??` could see a `false`
/// left side.
fn transform_logical<'a>(
    context: &mut TransformationContext<'a>,
    binary: &'a ts::BinaryExpression,
) -> Result<lua::Expression, TransformError> {
    let left = context.transform_expression(&binary.left)?;
    let (mut statements, right) =
        context.with_preceding_frame(|context| context.transform_expression(&binary.right))?;
    let left_type = context.checker.type_of(&binary.left);

    let inline = statements.is_empty()
        && (binary.operator != BinaryOperator::Coalesce || !left_type.can_be_false());
    if inline {
        let operator = if binary.operator == BinaryOperator::LogicalAnd {
            LuaOperator::And
        } else {
            LuaOperator::Or
        };
        return Ok(lua::Expression::binary(left, operator, right));
    }

    let temp = context.create_temp_for_expression(left, &temp_hint(&binary.left))?;
    let condition = match binary.operator {
        BinaryOperator::LogicalAnd => temp.clone(),
        BinaryOperator::LogicalOr => lua_ast::not(temp.clone()),
        _ => lua_ast::is_nil(temp.clone()),
    };
    statements.push(lua::Statement::assign_one(temp.clone(), right));
    context.add_preceding_statement(lua_ast::if_block(condition, statements))?;
    Ok(temp)
}

/// `typeof x === "string"` → `type(x) == "string"`.
fn transform_typeof_comparison<'a>(
    context: &mut TransformationContext<'a>,
    binary: &'a ts::BinaryExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let (operand, literal) = match (&binary.left.skip_outer().kind, &binary.right.skip_outer().kind) {
        (ts::ExpressionKind::Unary(unary), ts::ExpressionKind::String(literal))
        | (ts::ExpressionKind::String(literal), ts::ExpressionKind::Unary(unary))
            if unary.operator == UnaryOperator::TypeOf =>
        {
            (&*unary.operand, literal.as_str())
        }
        _ => return Ok(None),
    };
    let lua_type = match literal {
        "object" => "table",
        "undefined" => "nil",
        "string" | "number" | "boolean" | "function" => literal,
        _ => return Ok(None),
    };
    let value = context.transform_expression(operand)?;
    let operator = match binary.operator {
        BinaryOperator::Equal | BinaryOperator::StrictEqual => LuaOperator::Eq,
        _ => LuaOperator::Ne,
    };
    Ok(Some(lua::Expression::binary(
        lua::Expression::call(lua::Expression::identifier("type"), vec![value]),
        operator,
        lua::Expression::string(lua_type),
    )))
}

/// `(a(), b(), c)`: all but the last run as statements.
pub(crate) fn transform_comma_list_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Sequence(items) = &expression.kind else {
        return Ok(None);
    };
    let Some((last, rest)) = items.split_last() else {
        return Ok(Some(lua::Expression::nil()));
    };
    for item in rest {
        let statements = expression_statement::transform_expression_to_statements(context, item)?;
        context.add_preceding_statements(statements)?;
    }
    Ok(Some(context.transform_expression(last)?))
}
