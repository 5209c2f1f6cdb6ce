//! `switch` as a `repeat ... until true` block that `break` can leave.
//!
//! ```lua
//! repeat
//!     local ____switch = x
//!     local ____cond = ____switch == 1
//!     if ____cond then
//!         f()
//!     end
//!     ____cond = ____cond or ____switch == 2
//!     if ____cond then
//!         g()
//!         break
//!     end
//! until true
//! ```
//!
//! A clause runs when its own test matches or an earlier clause fell through
//! into it. `default` matches when no later test does.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_syntax_typescript as ts;

use crate::context::{ScopeType, TransformationContext};
use crate::error::TransformError;
use crate::lua_ast;

pub(crate) fn transform_switch_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Switch(switch) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    let value = context.transform_expression(&switch.expression)?;
    let switch_temp = lua::Identifier::new(context.create_temp_name("switch"));

    context.push_scope(ScopeType::Switch);
    let lowered = lower_clauses(context, &switch.clauses, switch_temp.clone().into());
    let scope = context.pop_scope()?;

    let mut body = vec![lua::Statement::local_one(switch_temp, Some(value))];
    body.extend(scope.finish(lowered?));
    Ok(vec![
        lua::Statement::repeat(lua::Block::new(body), lua::Expression::boolean(true)).with_range(range),
    ])
}

fn lower_clauses<'a>(
    context: &mut TransformationContext<'a>,
    clauses: &'a [ts::SwitchClause],
    value: lua::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    context.plan_switch(clauses)?;

    let condition = lua::Identifier::new(context.create_temp_name("cond"));
    let condition_ref: lua::Expression = condition.clone().into();
    let mut declared = false;
    let mut statements = Vec::new();

    for (index, clause) in clauses.iter().enumerate() {
        // A trailing default runs whenever it is reached.
        if clause.test.is_none() && index + 1 == clauses.len() {
            let body = context.transform_statements(&clause.statements)?;
            statements.push(lua::Statement::do_block(body));
            continue;
        }

        let (preceding, matches) = context.with_preceding_frame(|context| match &clause.test {
            Some(test) => {
                let test = context.transform_expression(test)?;
                Ok(lua::Expression::binary(value.clone(), BinaryOperator::Eq, test))
            }
            None => no_later_match(context, &clauses[index + 1..], &value),
        })?;

        if !declared && preceding.is_empty() {
            statements.push(lua::Statement::local_one(condition.clone(), Some(matches)));
        } else {
            if !declared {
                statements.push(lua::Statement::local_one(
                    condition.clone(),
                    Some(lua::Expression::boolean(false)),
                ));
            }
            if preceding.is_empty() {
                statements.push(lua::Statement::assign_one(
                    condition_ref.clone(),
                    lua::Expression::binary(condition_ref.clone(), BinaryOperator::Or, matches),
                ));
            } else {
                let mut guarded = preceding;
                guarded.push(lua::Statement::assign_one(condition_ref.clone(), matches));
                statements.push(lua_ast::if_block(lua_ast::not(condition_ref.clone()), guarded));
            }
        }
        declared = true;

        if clause.statements.is_empty() {
            continue;
        }
        let body = context.transform_statements(&clause.statements)?;
        statements.push(lua_ast::if_block(condition_ref.clone(), body).with_range(lua_ast::range(clause.span)));
    }
    Ok(statements)
}

/// `default:` matches when none of the clauses after it do.
fn no_later_match<'a>(
    context: &mut TransformationContext<'a>,
    later: &'a [ts::SwitchClause],
    value: &lua::Expression,
) -> Result<lua::Expression, TransformError> {
    let mut result: Option<lua::Expression> = None;
    for test in later.iter().filter_map(|clause| clause.test.as_ref()) {
        let test = context.transform_expression(test)?;
        let differs = lua::Expression::binary(value.clone(), BinaryOperator::Ne, test);
        result = Some(match result {
            Some(previous) => lua::Expression::binary(previous, BinaryOperator::And, differs),
            None => differs,
        });
    }
    Ok(result.unwrap_or_else(|| lua::Expression::boolean(true)))
}
