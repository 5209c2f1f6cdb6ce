//! Property and element access, assignment targets and optional chains.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{NodeId, SymbolId, Type};

use crate::builtins;
use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::{call, enums, identifier};

pub(crate) fn transform_property_access_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::PropertyAccess(access) = &expression.kind else {
        return Ok(None);
    };
    if let Some(chained) = transform_optional_chain(context, expression)? {
        return Ok(Some(chained));
    }
    let range = lua_ast::range(expression.span);
    let name = access.name.name.as_str();

    if let Some(lowered) = builtins::transform_builtin_property(context, expression, access)? {
        return Ok(Some(lowered.with_range(range)));
    }

    let object_type = context.checker.type_of(&access.object);
    if let Type::Enum(symbol) = &object_type {
        if let Some(inlined) = enums::transform_enum_member_access(context, *symbol, name) {
            return Ok(Some(inlined.with_range(range)));
        }
    }

    let object = context.transform_expression(&access.object)?;
    if is_accessor(context, &object_type, name) {
        return Ok(Some(
            lua::Expression::method_call(object, format!("get__{}", name), Vec::new())
                .with_range(range),
        ));
    }
    Ok(Some(lua::Expression::field(object, name).with_range(range)))
}

pub(crate) fn transform_element_access_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::ElementAccess(access) = &expression.kind else {
        return Ok(None);
    };
    if let Some(chained) = transform_optional_chain(context, expression)? {
        return Ok(Some(chained));
    }
    let range = lua_ast::range(expression.span);
    let object_type = context.checker.type_of(&access.object);

    if object_type.is_string() {
        let string = context.transform_expression(&access.object)?;
        let (statements, index) =
            context.with_preceding_frame(|context| context.transform_expression(&access.index))?;
        let string = if statements.is_empty() {
            string
        } else {
            context.move_to_preceding_temp(string, Some(&access.object))?
        };
        context.add_preceding_statements(statements)?;
        let index = context.move_to_preceding_temp(index, Some(&access.index))?;
        let start = lua_ast::add_to_numeric_expression(index, 1.0);
        return Ok(Some(
            lua::Expression::call(
                lua::Expression::path("string.sub"),
                vec![string, start.clone(), start],
            )
            .with_range(range),
        ));
    }

    let (table, index) = transform_table_and_index(context, access, false)?;
    Ok(Some(lua::Expression::table_index(table, index).with_range(range)))
}

/// Lower `object` and `index` in order, shifting numeric array indices to
/// Lua's 1-based convention.
fn transform_table_and_index<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::ElementAccess,
    cache: bool,
) -> Result<(lua::Expression, lua::Expression), TransformError> {
    let object_type = context.checker.type_of(&access.object);
    let table = context.transform_expression(&access.object)?;
    let (statements, index) =
        context.with_preceding_frame(|context| context.transform_expression(&access.index))?;
    let table = if cache || !statements.is_empty() {
        context.move_to_preceding_temp(table, Some(&access.object))?
    } else {
        table
    };
    context.add_preceding_statements(statements)?;
    let index = adjust_index(context, &object_type, &access.index, index);
    let index = if cache {
        context.move_to_preceding_temp(index, Some(&access.index))?
    } else {
        index
    };
    Ok((table, index))
}

/// `i + 1` when indexing an array with a number.
pub(crate) fn adjust_index(
    context: &TransformationContext<'_>,
    object_type: &Type,
    index_node: &ts::Expression,
    index: lua::Expression,
) -> lua::Expression {
    if object_type.is_array() && context.checker.type_of(index_node).is_number() {
        lua_ast::add_to_numeric_expression(index, 1.0)
    } else {
        index
    }
}

/// Class whose accessors apply to values of `ty`, and whether they are the
/// static ones.
fn accessor_owner(ty: &Type) -> Option<(SymbolId, bool)> {
    match ty.non_nullable() {
        Type::Instance(class) => Some((class, false)),
        Type::Class(class) => Some((class, true)),
        _ => None,
    }
}

fn is_accessor(context: &TransformationContext<'_>, object_type: &Type, name: &str) -> bool {
    accessor_owner(object_type)
        .is_some_and(|(class, is_static)| context.checker.has_accessor(class, name, is_static))
}

// =============================================================================
// Assignment targets
// =============================================================================

/// Something that can be read and written.
#[derive(Debug, Clone)]
pub(crate) enum LValue {
    /// A local, global or other name that is safe to repeat.
    Name(lua::Expression),
    Index {
        table: lua::Expression,
        index: lua::Expression,
    },
    /// Property with `get__x` / `set__x` accessors.
    Accessor {
        receiver: lua::Expression,
        name: String,
    },
}

impl LValue {
    pub(crate) fn read(&self) -> lua::Expression {
        match self {
            LValue::Name(expression) => expression.clone(),
            LValue::Index { table, index } => {
                lua::Expression::table_index(table.clone(), index.clone())
            }
            LValue::Accessor { receiver, name } => {
                lua::Expression::method_call(receiver.clone(), format!("get__{}", name), Vec::new())
            }
        }
    }

    pub(crate) fn write(&self, value: lua::Expression) -> lua::Statement {
        match self {
            LValue::Name(expression) => lua::Statement::assign_one(expression.clone(), value),
            LValue::Index { table, index } => lua::Statement::assign_one(
                lua::Expression::table_index(table.clone(), index.clone()),
                value,
            ),
            LValue::Accessor { receiver, name } => lua::Statement::expression(
                lua::Expression::method_call(
                    receiver.clone(),
                    format!("set__{}", name),
                    vec![value],
                ),
            ),
        }
    }

    /// Move the table, key and receiver into temps unless they are stable.
    pub(crate) fn cache(self, context: &mut TransformationContext<'_>) -> Result<Self, TransformError> {
        Ok(match self {
            LValue::Name(expression) => LValue::Name(expression),
            LValue::Index { table, index } => LValue::Index {
                table: context.move_to_preceding_temp(table, None)?,
                index: context.move_to_preceding_temp(index, None)?,
            },
            LValue::Accessor { receiver, name } => LValue::Accessor {
                receiver: context.move_to_preceding_temp(receiver, None)?,
                name,
            },
        })
    }

    /// Target usable on the left of a Lua multiple assignment.
    pub(crate) fn as_assignment_target(&self) -> Option<lua::Expression> {
        match self {
            LValue::Accessor { .. } => None,
            _ => Some(self.read()),
        }
    }
}

/// Lower an assignment target. With `cache`, the table and key are moved to
/// temps so the target can be read and then written.
pub(crate) fn transform_lvalue<'a>(
    context: &mut TransformationContext<'a>,
    target: &'a ts::Expression,
    cache: bool,
) -> Result<LValue, TransformError> {
    let inner = target.skip_outer();
    match &inner.kind {
        ts::ExpressionKind::Identifier(name) => Ok(LValue::Name(
            identifier::transform_identifier_reference(context, inner.id, name, inner.span),
        )),
        ts::ExpressionKind::PropertyAccess(access) if !access.optional => {
            let object_type = context.checker.type_of(&access.object);
            let name = access.name.name.clone();
            let receiver = context.transform_expression(&access.object)?;
            if is_accessor(context, &object_type, &name) {
                let receiver = if cache {
                    context.move_to_preceding_temp(receiver, Some(&access.object))?
                } else {
                    receiver
                };
                return Ok(LValue::Accessor { receiver, name });
            }
            let table = if cache {
                context.move_to_preceding_temp(receiver, Some(&access.object))?
            } else {
                receiver
            };
            Ok(LValue::Index {
                table,
                index: lua::Expression::string(name),
            })
        }
        ts::ExpressionKind::ElementAccess(access) if !access.optional => {
            let (table, index) = transform_table_and_index(context, access, cache)?;
            Ok(LValue::Index { table, index })
        }
        _ => {
            context.diagnose(
                target.span,
                DiagnosticCode::InvalidAssignmentTarget,
                "Invalid assignment target",
            );
            Ok(LValue::Name(lua::Expression::identifier("____")))
        }
    }
}

/// Lower a non-destructuring pattern used as an assignment target.
pub(crate) fn transform_pattern_lvalue<'a>(
    context: &mut TransformationContext<'a>,
    pattern: &'a ts::Pattern,
    cache: bool,
) -> Result<LValue, TransformError> {
    match &pattern.kind {
        ts::PatternKind::Identifier(name) => Ok(LValue::Name(
            identifier::transform_identifier_reference(context, pattern.id, name, pattern.span),
        )),
        ts::PatternKind::Expression(target) => transform_lvalue(context, target, cache),
        ts::PatternKind::Array(_) | ts::PatternKind::Object(_) => {
            context.diagnose(
                pattern.span,
                DiagnosticCode::InvalidAssignmentTarget,
                "Destructuring pattern used where a single target is expected",
            );
            Ok(LValue::Name(lua::Expression::identifier("____")))
        }
    }
}

// =============================================================================
// Optional chains
// =============================================================================

/// Lower `expression` when its chain contains an unguarded `?.` link.
///
/// The value before the innermost such link is cached, and the whole chain
/// is lowered again inside `if <value> ~= nil then ... end` with that link
/// treated as a plain access. Outer links repeat the process for their own
/// object.
pub(crate) fn transform_optional_chain<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
) -> Result<Option<lua::Expression>, TransformError> {
    let Some(link) = find_optional_link(context, expression) else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);

    let (target, call_callee) = match &link.kind {
        ts::ExpressionKind::PropertyAccess(access) => (&*access.object, None),
        ts::ExpressionKind::ElementAccess(access) => (&*access.object, None),
        ts::ExpressionKind::Call(call) => match &call.callee.kind {
            ts::ExpressionKind::PropertyAccess(access) => (&*access.object, Some(&*call.callee)),
            ts::ExpressionKind::ElementAccess(access) => (&*access.object, Some(&*call.callee)),
            _ => (&*call.callee, None),
        },
        _ => return Ok(None),
    };

    let value = context.transform_expression(target)?;
    let value = context.move_to_preceding_temp(value, Some(target))?;

    // `o.m?.()` reads `o.m` once and calls the cached function.
    let cached_call = match (call_callee, &link.kind) {
        (Some(callee), ts::ExpressionKind::Call(call)) => {
            let function = with_substitution(context, target.id, value.clone(), |context| {
                let function = context.transform_expression(callee)?;
                context.move_to_preceding_temp(function, Some(callee))
            })?;
            Some((call, callee, function))
        }
        _ => None,
    };
    let guarded = match &cached_call {
        Some((_, _, function)) => function.clone(),
        None => value.clone(),
    };

    let result = lua::Identifier::new(context.create_temp_name("opt"));
    context.add_preceding_statement(lua::Statement::local_one(result.clone(), None))?;

    context.guard_link(link.id);
    let lowered = with_substitution(context, target.id, value.clone(), |context| {
        context.with_preceding_frame(|context| {
            let Some((call, callee, function)) = cached_call else {
                return context.transform_expression(expression);
            };
            let lowered = call::transform_call_through(context, call, callee, function, value)?;
            with_substitution(context, link.id, lowered.with_range(lua_ast::range(link.span)), |context| {
                context.transform_expression(expression)
            })
        })
    });
    context.unguard_link(link.id);
    let (mut statements, lowered) = lowered?;

    statements.push(lua::Statement::assign_one(result.clone().into(), lowered));
    context.add_preceding_statement(lua_ast::if_block(lua_ast::is_not_nil(guarded), statements))?;
    Ok(Some(lua::Expression::from(result).with_range(range)))
}

/// Run `f` with `node` lowering to `value`.
fn with_substitution<'a, T>(
    context: &mut TransformationContext<'a>,
    node: NodeId,
    value: lua::Expression,
    f: impl FnOnce(&mut TransformationContext<'a>) -> Result<T, TransformError>,
) -> Result<T, TransformError> {
    context.substitute(node, value);
    let result = f(context);
    context.remove_substitution(node);
    result
}

/// The `?.` link closest to the start of the chain that is not yet guarded.
/// Parentheses end a chain.
fn find_optional_link<'a>(
    context: &TransformationContext<'a>,
    expression: &'a ts::Expression,
) -> Option<&'a ts::Expression> {
    let mut current = expression;
    let mut found = None;
    loop {
        let (optional, next) = match &current.kind {
            ts::ExpressionKind::PropertyAccess(access) => (access.optional, &*access.object),
            ts::ExpressionKind::ElementAccess(access) => (access.optional, &*access.object),
            ts::ExpressionKind::Call(call) => (call.optional, &*call.callee),
            _ => break,
        };
        if optional && !context.is_guarded_link(current.id) {
            found = Some(current);
        }
        current = next;
    }
    found
}
