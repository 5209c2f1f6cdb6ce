//! `if` statements and `c ? a : b`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;

use crate::context::{ScopeType, TransformationContext};
use crate::error::TransformError;
use crate::lua_ast;

pub(crate) fn transform_if_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::If(if_statement) = &statement.kind else {
        return Ok(Vec::new());
    };
    let lowered = lower_if(context, if_statement)?;
    Ok(vec![
        lua::Statement::new(lua::StatementKind::If(lowered)).with_range(lua_ast::range(statement.span)),
    ])
}

/// Lower an `if` and its `else if` chain. A later condition that needs helper
/// statements cannot be an `elseif`, so it opens a nested `if` in the
/// `else` block instead.
fn lower_if<'a>(
    context: &mut TransformationContext<'a>,
    if_statement: &'a ts::IfStatement,
) -> Result<lua::IfStatement, TransformError> {
    let condition = context.transform_expression(&if_statement.condition)?;
    let then_block = context.transform_body(&if_statement.then_branch, ScopeType::Conditional)?;

    let else_branch = match &if_statement.else_branch {
        None => None,
        Some(branch) => match &branch.kind {
            ts::StatementKind::If(nested) => {
                let (preceding, nested) = context.with_preceding_frame(|context| lower_if(context, nested))?;
                if preceding.is_empty() {
                    Some(lua::ElseBranch::ElseIf(Box::new(nested)))
                } else {
                    let mut statements = preceding;
                    statements.push(
                        lua::Statement::new(lua::StatementKind::If(nested))
                            .with_range(lua_ast::range(branch.span)),
                    );
                    Some(lua::ElseBranch::Block(lua::Block::new(statements)))
                }
            }
            _ => Some(lua::ElseBranch::Block(lua::Block::new(
                context.transform_body(branch, ScopeType::Conditional)?,
            ))),
        },
    };

    Ok(lua::IfStatement {
        condition,
        then_block: lua::Block::new(then_block),
        else_branch,
    })
}

/// `c and a or b` when `a` is never falsy in Lua, otherwise a temp assigned
/// in both branches of an `if`.
pub(crate) fn transform_conditional_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Conditional(conditional) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    let condition = context.transform_expression(&conditional.condition)?;
    let (mut when_true_statements, when_true) =
        context.with_preceding_frame(|context| context.transform_expression(&conditional.when_true))?;
    let (mut when_false_statements, when_false) =
        context.with_preceding_frame(|context| context.transform_expression(&conditional.when_false))?;

    let true_type = context.checker.type_of(&conditional.when_true);
    if when_true_statements.is_empty() && when_false_statements.is_empty() && !true_type.can_be_falsy() {
        return Ok(Some(
            lua::Expression::binary(
                lua::Expression::binary(condition, lua::BinaryOperator::And, when_true),
                lua::BinaryOperator::Or,
                when_false,
            )
            .with_range(range),
        ));
    }

    let temp = lua::Identifier::new(context.create_temp_name("cond"));
    let target: lua::Expression = temp.clone().into();
    context.add_preceding_statement(lua::Statement::local_one(temp, None))?;
    when_true_statements.push(lua::Statement::assign_one(target.clone(), when_true));
    when_false_statements.push(lua::Statement::assign_one(target.clone(), when_false));
    context.add_preceding_statement(lua::Statement::if_then(
        condition,
        lua::Block::new(when_true_statements),
        Some(lua::ElseBranch::Block(lua::Block::new(when_false_statements))),
    ))?;
    Ok(Some(target.with_range(range)))
}
