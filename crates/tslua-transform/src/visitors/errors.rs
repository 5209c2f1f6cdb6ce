//! `throw` and `try` / `catch` / `finally`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::NodeFlags;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::PatternKind;

use crate::context::{ScopeType, TransformationContext};
use crate::error::TransformError;
use crate::lua_ast;

use super::destructuring::{self, BindingMode};
use super::function::mark_try_return;
use super::identifier::create_local_identifier;

const TRY: &str = "____try";
const HAS_RETURNED: &str = "____hasReturned";
const RETURN_VALUE: &str = "____returnValue";
const CATCH: &str = "____catch";

/// `throw e` → `error(e, 0)`.
pub(crate) fn transform_throw_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Throw(value) = &statement.kind else {
        return Ok(Vec::new());
    };
    let value = context.transform_expression(value)?;
    Ok(vec![
        lua::Statement::expression(lua::Expression::call(
            lua::Expression::identifier("error"),
            vec![value, lua::Expression::number(0.0)],
        ))
        .with_range(lua_ast::range(statement.span)),
    ])
}

/// Lower `try` through `pcall`.
///
/// ```lua
/// do
///     local ____try, ____hasReturned, ____returnValue = pcall(function()
///         -- try body; `return v` becomes `return true, v`
///     end)
///     if not ____try then
///         ____hasReturned, ____returnValue = ____catch(____hasReturned)
///     end
///     -- finally body
///     if ____hasReturned then
///         return ____returnValue
///     end
/// end
/// ```
///
/// With a `finally` block the catch body is protected as well, and an error
/// that was not handled is raised again after `finally` ran.
pub(crate) fn transform_try_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Try(try_statement) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    let try_ok: lua::Expression = lua::Expression::identifier(TRY);
    let has_returned = lua::Expression::identifier(HAS_RETURNED);
    let return_value = lua::Expression::identifier(RETURN_VALUE);

    let ((), try_body, mut returns) =
        lower_protected(context, &try_statement.block, ScopeType::Try, |_| Ok(((), Vec::new())))?;
    let try_function = lua::Expression::function(Vec::new(), false, lua::Block::new(try_body), NodeFlags::empty());

    let mut statements = vec![lua::Statement::local(
        vec![
            lua::Identifier::new(TRY),
            lua::Identifier::new(HAS_RETURNED),
            lua::Identifier::new(RETURN_VALUE),
        ],
        vec![lua::Expression::call(lua::Expression::identifier("pcall"), vec![try_function])],
    )];

    let protect_catch = try_statement.finally_block.is_some();
    if let Some(catch_clause) = &try_statement.catch_clause {
        let (catch_function, catch_returns) = transform_catch_clause(context, catch_clause)?;
        returns |= catch_returns;
        statements.push(lua::Statement::local_one(lua::Identifier::new(CATCH), Some(catch_function)));
        let handled = if protect_catch {
            lua::Statement::assign(
                vec![try_ok.clone(), has_returned.clone(), return_value.clone()],
                vec![lua::Expression::call(
                    lua::Expression::identifier("pcall"),
                    vec![lua::Expression::identifier(CATCH), has_returned.clone()],
                )],
            )
        } else {
            lua::Statement::assign(
                vec![has_returned.clone(), return_value.clone()],
                vec![lua::Expression::call(
                    lua::Expression::identifier(CATCH),
                    vec![has_returned.clone()],
                )],
            )
        };
        statements.push(lua_ast::if_block(lua_ast::not(try_ok.clone()), vec![handled]));
    }

    if let Some(finally_block) = &try_statement.finally_block {
        statements.extend(context.transform_body(finally_block, ScopeType::Block)?);
    }

    if try_statement.catch_clause.is_none() || protect_catch {
        // Raise the error again, preserving the original value.
        statements.push(lua_ast::if_block(
            lua_ast::not(try_ok),
            vec![lua::Statement::expression(lua::Expression::call(
                lua::Expression::identifier("error"),
                vec![has_returned.clone(), lua::Expression::number(0.0)],
            ))],
        ));
    }

    if returns {
        let mut values = vec![return_value];
        if mark_try_return(context) {
            values.insert(0, lua::Expression::boolean(true));
        }
        statements.push(lua_ast::if_block(has_returned, vec![lua::Statement::ret(values)]));
    }

    Ok(vec![lua::Statement::do_block(statements).with_range(range)])
}

/// Lower a try or catch body in its own scope, reporting whether it returns.
/// `prologue` runs first inside the scope and binds names the body uses.
fn lower_protected<'a, T>(
    context: &mut TransformationContext<'a>,
    block: &'a ts::Statement,
    kind: ScopeType,
    prologue: impl FnOnce(&mut TransformationContext<'a>) -> Result<(T, Vec<lua::Statement>), TransformError>,
) -> Result<(T, Vec<lua::Statement>, bool), TransformError> {
    let statements: &'a [ts::Statement] = match &block.kind {
        ts::StatementKind::Block(statements) => statements,
        _ => std::slice::from_ref(block),
    };
    context.push_scope(kind);
    let lowered = lower_scope_body(context, statements, prologue);
    let scope = context.pop_scope()?;
    let returns = scope.try_has_return;
    let (value, mut prologue, body) = lowered?;
    prologue.extend(scope.finish(body));
    Ok((value, prologue, returns))
}

fn lower_scope_body<'a, T>(
    context: &mut TransformationContext<'a>,
    statements: &'a [ts::Statement],
    prologue: impl FnOnce(&mut TransformationContext<'a>) -> Result<(T, Vec<lua::Statement>), TransformError>,
) -> Result<(T, Vec<lua::Statement>, Vec<lua::Statement>), TransformError> {
    let (value, prologue) = prologue(context)?;
    context.plan_block(statements)?;
    let body = context.transform_statements(statements)?;
    Ok((value, prologue, body))
}

/// `function(e) ... end` for the catch clause.
fn transform_catch_clause<'a>(
    context: &mut TransformationContext<'a>,
    catch_clause: &'a ts::CatchClause,
) -> Result<(lua::Expression, bool), TransformError> {
    let (params, body, returns) =
        lower_protected(context, &catch_clause.block, ScopeType::Catch, |context| {
            let Some(parameter) = &catch_clause.parameter else {
                return Ok((Vec::new(), Vec::new()));
            };
            match &parameter.kind {
                PatternKind::Identifier(name) => {
                    let symbol = context.symbol_of(parameter.id);
                    let name = create_local_identifier(context, symbol, name, parameter.span);
                    Ok((vec![name], Vec::new()))
                }
                _ => {
                    let temp = lua::Identifier::new(context.create_temp_name("error"));
                    let statements = destructuring::transform_binding_pattern(
                        context,
                        parameter,
                        temp.clone().into(),
                        BindingMode::Declare,
                    )?;
                    Ok((vec![temp], statements))
                }
            }
        })?;
    let function = lua::Expression::function(params, false, lua::Block::new(body), NodeFlags::DECLARATION)
        .with_range(lua_ast::range(catch_clause.span));
    Ok((function, returns))
}
