//! Loops, `break`, `continue` and labels.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{ForBinding, PatternKind};

use crate::context::{ScopeType, TransformationContext};
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::destructuring::{self, BindingMode};
use super::identifier::create_local_identifier;
use super::{access, expression_statement, variable};

/// Lowered loop body and the label `continue` jumps to, if any.
struct LoopBody {
    statements: Vec<lua::Statement>,
    continue_label: Option<String>,
}

impl LoopBody {
    /// Body statements for the Lua loop. With `isolate`, the body is always a
    /// `do` block so its locals stay out of the code that follows it.
    fn into_statements(self, isolate: bool) -> Vec<lua::Statement> {
        match self.continue_label {
            Some(label) => vec![lua::Statement::do_block(self.statements), lua::Statement::label(label)],
            None if isolate => vec![lua::Statement::do_block(self.statements)],
            None => self.statements,
        }
    }
}

fn continue_label(scope_id: usize) -> String {
    format!("__continue{}", scope_id)
}

/// Lower a loop body in its own loop scope, with `prologue` binding the loop
/// variables first.
fn transform_loop_body<'a>(
    context: &mut TransformationContext<'a>,
    body: &'a ts::Statement,
    prologue: Vec<lua::Statement>,
) -> Result<LoopBody, TransformError> {
    let statements: &'a [ts::Statement] = match &body.kind {
        ts::StatementKind::Block(statements) => statements,
        _ => std::slice::from_ref(body),
    };
    let id = context.push_scope(ScopeType::Loop);
    let lowered = lower_statements(context, statements);
    let scope = context.pop_scope()?;
    let continued = scope.loop_continued;
    let mut result = prologue;
    result.extend(scope.finish(lowered?));
    Ok(LoopBody {
        statements: result,
        continue_label: continued.then(|| continue_label(id)),
    })
}

fn lower_statements<'a>(
    context: &mut TransformationContext<'a>,
    statements: &'a [ts::Statement],
) -> Result<Vec<lua::Statement>, TransformError> {
    context.plan_block(statements)?;
    context.transform_statements(statements)
}

/// Loop condition, or `true` plus the statements for a leading
/// `if not cond then break end` when the condition needs helper statements.
fn transform_loop_condition<'a>(
    context: &mut TransformationContext<'a>,
    condition: &'a ts::Expression,
) -> Result<(Vec<lua::Statement>, lua::Expression), TransformError> {
    let (mut statements, condition) =
        context.with_preceding_frame(|context| context.transform_expression(condition))?;
    if statements.is_empty() {
        return Ok((statements, condition));
    }
    statements.push(lua_ast::if_block(lua_ast::not(condition), vec![lua::Statement::break_loop()]));
    Ok((statements, lua::Expression::boolean(true)))
}

pub(crate) fn transform_while_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::While(while_statement) = &statement.kind else {
        return Ok(Vec::new());
    };
    let (mut statements, condition) = transform_loop_condition(context, &while_statement.condition)?;
    let body = transform_loop_body(context, &while_statement.body, Vec::new())?;
    statements.extend(body.into_statements(false));
    Ok(vec![
        lua::Statement::while_loop(condition, lua::Block::new(statements))
            .with_range(lua_ast::range(statement.span)),
    ])
}

/// `do body while (cond)` → `repeat do body end until not cond`.
pub(crate) fn transform_do_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::DoWhile(do_statement) = &statement.kind else {
        return Ok(Vec::new());
    };
    let body = transform_loop_body(context, &do_statement.body, Vec::new())?;
    let mut statements = body.into_statements(true);
    let (preceding, condition) =
        context.with_preceding_frame(|context| context.transform_expression(&do_statement.condition))?;
    statements.extend(preceding);
    Ok(vec![
        lua::Statement::repeat(lua::Block::new(statements), lua_ast::not(condition))
            .with_range(lua_ast::range(statement.span)),
    ])
}

/// `for (init; cond; step) body` →
/// `do init; while cond do do body end; step end end`.
pub(crate) fn transform_for_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::For(for_statement) = &statement.kind else {
        return Ok(Vec::new());
    };
    context.push_scope(ScopeType::Block);
    let lowered = lower_for(context, for_statement, statement.span);
    let scope = context.pop_scope()?;
    let statements = scope.finish(lowered?);
    Ok(vec![lua::Statement::do_block(statements).with_range(lua_ast::range(statement.span))])
}

fn lower_for<'a>(
    context: &mut TransformationContext<'a>,
    for_statement: &'a ts::ForStatement,
    span: ts::Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = Vec::new();
    match &for_statement.initializer {
        Some(ts::ForInitializer::Variable(variable)) => {
            let (preceding, declarations) = context.with_preceding_frame(|context| {
                variable::transform_variable_declarations(context, variable, span)
            })?;
            statements.extend(preceding);
            statements.extend(declarations);
        }
        Some(ts::ForInitializer::Expression(expression)) => {
            let (preceding, lowered) = context.with_preceding_frame(|context| {
                expression_statement::transform_expression_to_statements(context, expression)
            })?;
            statements.extend(preceding);
            statements.extend(lowered);
        }
        None => {}
    }

    let (mut loop_body, condition) = match &for_statement.condition {
        Some(condition) => transform_loop_condition(context, condition)?,
        None => (Vec::new(), lua::Expression::boolean(true)),
    };
    let body = transform_loop_body(context, &for_statement.body, Vec::new())?;
    loop_body.extend(body.into_statements(true));
    if let Some(incrementor) = &for_statement.incrementor {
        let (preceding, lowered) = context.with_preceding_frame(|context| {
            expression_statement::transform_expression_to_statements(context, incrementor)
        })?;
        loop_body.extend(preceding);
        loop_body.extend(lowered);
    }
    statements.push(lua::Statement::while_loop(condition, lua::Block::new(loop_body)));
    Ok(statements)
}

/// Loop variable of a `for-of` / `for-in` head and the statements binding
/// the source-level names from it.
fn transform_loop_binding<'a>(
    context: &mut TransformationContext<'a>,
    binding: &'a ForBinding,
) -> Result<(lua::Identifier, Vec<lua::Statement>), TransformError> {
    match binding {
        ForBinding::Declaration(_, pattern) => match &pattern.kind {
            PatternKind::Identifier(name) => {
                let symbol = context.symbol_of(pattern.id);
                Ok((create_local_identifier(context, symbol, name, pattern.span), Vec::new()))
            }
            _ => {
                let temp = lua::Identifier::new(context.create_temp_name("value"));
                let statements = destructuring::transform_binding_pattern(
                    context,
                    pattern,
                    temp.clone().into(),
                    BindingMode::Declare,
                )?;
                Ok((temp, statements))
            }
        },
        ForBinding::Target(pattern) => {
            let temp = lua::Identifier::new(context.create_temp_name("value"));
            let value: lua::Expression = temp.clone().into();
            let statements = match &pattern.kind {
                PatternKind::Object(_) => {
                    context.diagnose(
                        pattern.span,
                        DiagnosticCode::UnsupportedObjectDestructuringInForOf,
                        "Object destructuring assignment in a loop head is not supported; declare the loop variable instead",
                    );
                    Vec::new()
                }
                PatternKind::Array(_) => {
                    destructuring::transform_binding_pattern(context, pattern, value, BindingMode::Assign)?
                }
                _ => {
                    let (mut statements, lvalue) = context
                        .with_preceding_frame(|context| access::transform_pattern_lvalue(context, pattern, false))?;
                    statements.push(lvalue.write(value));
                    statements
                }
            };
            Ok((temp, statements))
        }
    }
}

/// `for (const x of a)` → `for ____, x in ipairs(a)` for arrays and
/// `for ____, x in __TS__Iterator(a)` for other iterables.
pub(crate) fn transform_for_of_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::ForOf(for_of) = &statement.kind else {
        return Ok(Vec::new());
    };
    let iterable_type = context.checker.type_of(&for_of.expression);
    let iterable = context.transform_expression(&for_of.expression)?;
    let iterator = if iterable_type.is_array() {
        lua::Expression::call(lua::Expression::identifier("ipairs"), vec![iterable])
    } else {
        context.transform_lualib_call(LuaLibFeature::Iterator, vec![iterable])
    };

    context.push_scope(ScopeType::Block);
    let lowered = transform_loop_binding(context, &for_of.binding).and_then(|(variable, prologue)| {
        let body = transform_loop_body(context, &for_of.body, prologue)?;
        Ok((variable, body))
    });
    context.pop_scope()?;
    let (variable, body) = lowered?;

    Ok(vec![
        lua::Statement::for_in(
            vec![lua::Identifier::new("____"), variable],
            vec![iterator],
            lua::Block::new(body.into_statements(false)),
        )
        .with_range(lua_ast::range(statement.span)),
    ])
}

/// `for (const k in o)` → `for k in pairs(o)`.
pub(crate) fn transform_for_in_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::ForIn(for_in) = &statement.kind else {
        return Ok(Vec::new());
    };
    if context.checker.type_of(&for_in.expression).is_array() {
        context.diagnose(
            for_in.expression.span,
            DiagnosticCode::ForbiddenForIn,
            "Iterating over arrays with 'for ... in' is not allowed",
        );
    }
    let object = context.transform_expression(&for_in.expression)?;

    context.push_scope(ScopeType::Block);
    let lowered = transform_loop_binding(context, &for_in.binding).and_then(|(variable, prologue)| {
        let body = transform_loop_body(context, &for_in.body, prologue)?;
        Ok((variable, body))
    });
    context.pop_scope()?;
    let (variable, body) = lowered?;

    Ok(vec![
        lua::Statement::for_in(
            vec![variable],
            vec![lua::Expression::call(lua::Expression::identifier("pairs"), vec![object])],
            lua::Block::new(body.into_statements(false)),
        )
        .with_range(lua_ast::range(statement.span)),
    ])
}

pub(crate) fn transform_break_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Break(label) = &statement.kind else {
        return Ok(Vec::new());
    };
    if let Some(label) = label {
        report_label(context, label);
    }
    Ok(vec![lua::Statement::break_loop().with_range(lua_ast::range(statement.span))])
}

/// `continue` → `goto __continueN`, where the label follows the body of the
/// innermost loop.
pub(crate) fn transform_continue_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Continue(label) = &statement.kind else {
        return Ok(Vec::new());
    };
    if let Some(label) = label {
        report_label(context, label);
    }
    let target = context.options.lua_target;
    if !target.supports_goto() {
        context.diagnose(
            statement.span,
            DiagnosticCode::UnsupportedForTarget,
            format!("'continue' is not supported for target Lua {}", target),
        );
    }
    let Some(scope) = context.find_scope_mut(&[ScopeType::Loop]) else {
        return Ok(Vec::new());
    };
    scope.loop_continued = true;
    let label = continue_label(scope.id);
    Ok(vec![lua::Statement::goto(label).with_range(lua_ast::range(statement.span))])
}

/// Labels are reported and the labeled statement is lowered as if unlabeled.
pub(crate) fn transform_labeled_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Labeled(labeled) = &statement.kind else {
        return Ok(Vec::new());
    };
    report_label(context, &labeled.label);
    context.transform_statement(&labeled.body)
}

fn report_label(context: &mut TransformationContext<'_>, label: &ts::Ident) {
    context.diagnose(
        label.span,
        DiagnosticCode::UnsupportedLabel,
        format!("Labeled statements are not supported ('{}')", label.name),
    );
}
