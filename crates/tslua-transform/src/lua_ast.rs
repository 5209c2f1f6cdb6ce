//! Lua construction helpers shared by the visitors.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::{BinaryOperator, ExpressionKind, NodeFlags};
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript::{Span, Type};

use crate::context::TransformationContext;
use crate::options::LuaTarget;

pub(crate) const EXPORTS: &str = "____exports";
pub(crate) const SELF: &str = "self";

pub(crate) fn range(span: Span) -> Option<lua::SourceRange> {
    Some(lua::SourceRange {
        start: span.start,
        end: span.end,
        line: span.line,
        column: span.column,
    })
}

pub(crate) fn exports() -> lua::Expression {
    lua::Expression::identifier(EXPORTS)
}

/// `expression + change`, folding literals and cancelling a trailing
/// `+ n` / `- n` so that `i - 1` adjusted by one becomes `i`.
pub(crate) fn add_to_numeric_expression(expression: lua::Expression, change: f64) -> lua::Expression {
    if change == 0.0 {
        return expression;
    }
    let range = expression.range;
    match expression.kind {
        ExpressionKind::Number(value) => lua::Expression::number(value + change).with_range(range),
        ExpressionKind::Binary {
            operator: operator @ (BinaryOperator::Add | BinaryOperator::Sub),
            left,
            right,
        } if right.as_number().is_some() => {
            let offset = right.as_number().unwrap_or_default();
            let current = if operator == BinaryOperator::Add {
                offset
            } else {
                -offset
            };
            offset_expression(*left, current + change).with_range(range)
        }
        kind => {
            let expression = lua::Expression {
                kind,
                range,
                flags: NodeFlags::empty(),
            };
            offset_expression(expression, change).with_range(range)
        }
    }
}

fn offset_expression(expression: lua::Expression, offset: f64) -> lua::Expression {
    if offset == 0.0 {
        expression
    } else if offset > 0.0 {
        lua::Expression::binary(expression, BinaryOperator::Add, lua::Expression::number(offset))
    } else {
        lua::Expression::binary(expression, BinaryOperator::Sub, lua::Expression::number(-offset))
    }
}

/// Call that expands an array into a value list on the current target.
pub(crate) fn create_unpack_call(
    context: &mut TransformationContext<'_>,
    expression: lua::Expression,
) -> lua::Expression {
    let range = expression.range;
    let call = match context.options.lua_target {
        LuaTarget::Universal => context.transform_lualib_call(LuaLibFeature::Unpack, vec![expression]),
        LuaTarget::Lua51 | LuaTarget::LuaJit => {
            lua::Expression::call(lua::Expression::identifier("unpack"), vec![expression])
        }
        LuaTarget::Lua52 | LuaTarget::Lua53 | LuaTarget::Lua54 => {
            lua::Expression::call(lua::Expression::path("table.unpack"), vec![expression])
        }
    };
    call.with_range(range).with_flags(NodeFlags::TABLE_UNPACK_CALL)
}

/// Operand of `..`, converted with `tostring` unless it is already a string
/// or a number.
pub(crate) fn wrap_in_to_string(expression: lua::Expression, ty: &Type) -> lua::Expression {
    if ty.is_string() || ty.is_number() || expression.as_string().is_some() {
        return expression;
    }
    if expression.as_number().is_some() {
        return expression;
    }
    let range = expression.range;
    lua::Expression::call(lua::Expression::identifier("tostring"), vec![expression]).with_range(range)
}

pub(crate) fn not(expression: lua::Expression) -> lua::Expression {
    lua::Expression::unary(lua::UnaryOperator::Not, expression)
}

pub(crate) fn is_nil(expression: lua::Expression) -> lua::Expression {
    lua::Expression::binary(expression, BinaryOperator::Eq, lua::Expression::nil())
}

pub(crate) fn is_not_nil(expression: lua::Expression) -> lua::Expression {
    lua::Expression::binary(expression, BinaryOperator::Ne, lua::Expression::nil())
}

/// `#expression`.
pub(crate) fn length(expression: lua::Expression) -> lua::Expression {
    lua::Expression::unary(lua::UnaryOperator::Length, expression)
}

/// `if <condition> then <statements> end`.
pub(crate) fn if_block(condition: lua::Expression, statements: Vec<lua::Statement>) -> lua::Statement {
    lua::Statement::if_then(condition, lua::Block::new(statements), None)
}

/// Strip redundant parentheses added around a single value.
pub(crate) fn unwrap_parentheses(expression: lua::Expression) -> lua::Expression {
    match expression.kind {
        ExpressionKind::Parenthesized(inner) => unwrap_parentheses(*inner),
        kind => lua::Expression {
            kind,
            range: expression.range,
            flags: expression.flags,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(expression: &lua::Expression) -> String {
        match &expression.kind {
            ExpressionKind::Number(value) => value.to_string(),
            ExpressionKind::Identifier(identifier) => identifier.text.clone(),
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => format!("{} {} {}", render(left), operator.token(), render(right)),
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn test_literal_index_is_folded() {
        let folded = add_to_numeric_expression(lua::Expression::number(2.0), 1.0);
        assert_eq!(folded.as_number(), Some(3.0));
    }

    #[test]
    fn test_subtraction_cancels() {
        let index = lua::Expression::binary(
            lua::Expression::identifier("i"),
            BinaryOperator::Sub,
            lua::Expression::number(1.0),
        );
        assert_eq!(render(&add_to_numeric_expression(index, 1.0)), "i");
    }

    #[test]
    fn test_partial_cancellation() {
        let index = lua::Expression::binary(
            lua::Expression::identifier("i"),
            BinaryOperator::Sub,
            lua::Expression::number(3.0),
        );
        assert_eq!(render(&add_to_numeric_expression(index, 1.0)), "i - 2");
    }

    #[test]
    fn test_identifier_gets_offset() {
        let index = lua::Expression::identifier("i");
        assert_eq!(render(&add_to_numeric_expression(index, 1.0)), "i + 1");
    }
}
