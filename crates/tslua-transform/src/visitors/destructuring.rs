//! Array and object destructuring for declarations, parameters, loop
//! variables and assignments.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{ArrayPatternElement, PatternKind};

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;

use super::access;
use super::literal::transform_property_name;
use super::variable::{self, Binding};
use super::{identifier, spread, tuple};

/// Whether pattern leaves declare new names or assign existing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingMode {
    Declare,
    Assign,
}

/// `const [a, b] = init` and `const { x } = init`.
pub(crate) fn transform_variable_destructuring<'a>(
    context: &mut TransformationContext<'a>,
    pattern: &'a ts::Pattern,
    initializer: &'a ts::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    if let Some(targets) = simple_array_targets(pattern) {
        if let Some(values) = transform_values_in_place(context, targets.len(), initializer)? {
            let bindings: Vec<Binding> = targets
                .iter()
                .filter_map(|target| Binding::from_pattern(context, target))
                .collect();
            return variable::create_local_or_exported_or_global_declaration(context, &bindings, values);
        }
    }
    let value = context.transform_expression(initializer)?;
    transform_binding_pattern(context, pattern, value, BindingMode::Declare)
}

/// `[a, b] = value` as a statement.
pub(crate) fn transform_assignment_destructuring<'a>(
    context: &mut TransformationContext<'a>,
    pattern: &'a ts::Pattern,
    value: lua::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    transform_binding_pattern(context, pattern, value, BindingMode::Assign)
}

/// Targets of an array pattern without holes, rest elements, defaults or
/// nesting.
pub(crate) fn simple_array_targets(pattern: &ts::Pattern) -> Option<Vec<&ts::Pattern>> {
    let PatternKind::Array(elements) = &pattern.kind else {
        return None;
    };
    elements
        .iter()
        .map(|element| match element {
            Some(ArrayPatternElement {
                target,
                default: None,
                rest: false,
            }) if matches!(target.kind, PatternKind::Identifier(_) | PatternKind::Expression(_)) => {
                Some(target)
            }
            _ => None,
        })
        .collect()
}

/// Values to assign element-wise without an intermediate table: the
/// elements of an array literal, or the results of a multi-value call.
pub(crate) fn transform_values_in_place<'a>(
    context: &mut TransformationContext<'a>,
    count: usize,
    initializer: &'a ts::Expression,
) -> Result<Option<Vec<lua::Expression>>, TransformError> {
    let inner = initializer.skip_outer();
    match &inner.kind {
        ts::ExpressionKind::Array(elements)
            if elements.len() >= count
                && !elements
                    .iter()
                    .any(|element| matches!(element.kind, ts::ExpressionKind::Spread(_))) =>
        {
            Ok(Some(spread::transform_expression_list(context, elements, false)?))
        }
        ts::ExpressionKind::Call(call) if context.checker.returns_multi(call) => {
            if context.checker.is_multi_helper_call(call) {
                return Ok(Some(spread::transform_expression_list(context, &call.arguments, true)?));
            }
            Ok(Some(vec![tuple::transform_multi_value(context, inner, call)?]))
        }
        _ => Ok(None),
    }
}

/// Bind `pattern` to `value`. Helper statements needed by defaults and
/// computed keys are part of the result.
pub(crate) fn transform_binding_pattern<'a>(
    context: &mut TransformationContext<'a>,
    pattern: &'a ts::Pattern,
    value: lua::Expression,
    mode: BindingMode,
) -> Result<Vec<lua::Statement>, TransformError> {
    match &pattern.kind {
        PatternKind::Identifier(_) | PatternKind::Expression(_) => bind_leaf(context, pattern, value, mode),
        PatternKind::Array(elements) => {
            let mut statements = Vec::new();
            let root = cache_root(context, value, &mut statements);
            for (index, element) in elements.iter().enumerate() {
                let Some(element) = element else {
                    continue;
                };
                let element_value = if element.rest {
                    context.transform_lualib_call(
                        LuaLibFeature::ArraySlice,
                        vec![root.clone(), lua::Expression::number(index as f64)],
                    )
                } else {
                    lua::Expression::table_index(root.clone(), lua::Expression::number((index + 1) as f64))
                };
                statements.extend(bind_with_default(
                    context,
                    &element.target,
                    element.default.as_ref(),
                    element_value,
                    mode,
                )?);
            }
            Ok(statements)
        }
        PatternKind::Object(properties) => {
            let mut statements = Vec::new();
            let root = cache_root(context, value, &mut statements);
            let mut used_keys: Vec<lua::Expression> = Vec::new();
            for property in properties {
                let Some(key) = &property.key else {
                    let used = used_keys
                        .iter()
                        .map(|key| lua::TableField::keyed(key.clone(), lua::Expression::boolean(true)))
                        .collect();
                    let rest = context.transform_lualib_call(
                        LuaLibFeature::ObjectRest,
                        vec![root.clone(), lua::Expression::table(used)],
                    );
                    statements.extend(bind_with_default(context, &property.target, None, rest, mode)?);
                    continue;
                };
                let (preceding, key) =
                    context.with_preceding_frame(|context| transform_property_name(context, key))?;
                statements.extend(preceding);
                let key = if needs_cache(&key) {
                    cache_root(context, key, &mut statements)
                } else {
                    key
                };
                used_keys.push(key.clone());
                let property_value = lua::Expression::table_index(root.clone(), key);
                statements.extend(bind_with_default(
                    context,
                    &property.target,
                    property.default.as_ref(),
                    property_value,
                    mode,
                )?);
            }
            Ok(statements)
        }
    }
}

/// Computed keys are read twice when an object rest follows.
fn needs_cache(key: &lua::Expression) -> bool {
    !key.is_literal() && key.as_identifier().is_none()
}

/// Store `value` in a temp unless it is a plain name.
fn cache_root(
    context: &mut TransformationContext<'_>,
    value: lua::Expression,
    statements: &mut Vec<lua::Statement>,
) -> lua::Expression {
    if value.is_literal() || value.as_identifier().is_some() {
        return value;
    }
    let temp = lua::Identifier::new(context.create_temp_name("destructured")).with_range(value.range);
    statements.push(lua::Statement::local_one(temp.clone(), Some(value)));
    temp.into()
}

fn bind_with_default<'a>(
    context: &mut TransformationContext<'a>,
    target: &'a ts::Pattern,
    default: Option<&'a ts::Expression>,
    value: lua::Expression,
    mode: BindingMode,
) -> Result<Vec<lua::Statement>, TransformError> {
    let Some(default) = default else {
        return transform_binding_pattern(context, target, value, mode);
    };

    let (mut default_statements, default_value) =
        context.with_preceding_frame(|context| context.transform_expression(default))?;

    if matches!(target.kind, PatternKind::Identifier(_)) {
        let mut statements = bind_leaf(context, target, value, mode)?;
        let current = leaf_reference(context, target, mode);
        default_statements.push(lua::Statement::assign_one(current.clone(), default_value));
        statements.push(lua_ast::if_block(lua_ast::is_nil(current), default_statements));
        return Ok(statements);
    }

    let temp = lua::Identifier::new(context.create_temp_name("default"));
    let mut statements = vec![lua::Statement::local_one(temp.clone(), Some(value))];
    let temp: lua::Expression = temp.into();
    default_statements.push(lua::Statement::assign_one(temp.clone(), default_value));
    statements.push(lua_ast::if_block(lua_ast::is_nil(temp.clone()), default_statements));
    statements.extend(transform_binding_pattern(context, target, temp, mode)?);
    Ok(statements)
}

/// Bind a single name or assignment target.
fn bind_leaf<'a>(
    context: &mut TransformationContext<'a>,
    target: &'a ts::Pattern,
    value: lua::Expression,
    mode: BindingMode,
) -> Result<Vec<lua::Statement>, TransformError> {
    match (mode, &target.kind) {
        (BindingMode::Declare, PatternKind::Identifier(_)) => {
            let Some(binding) = Binding::from_pattern(context, target) else {
                return Ok(Vec::new());
            };
            variable::create_local_or_exported_or_global_declaration(context, &[binding], vec![value])
        }
        (_, PatternKind::Array(_) | PatternKind::Object(_)) => {
            transform_binding_pattern(context, target, value, mode)
        }
        _ => {
            let (mut statements, lvalue) =
                context.with_preceding_frame(|context| access::transform_pattern_lvalue(context, target, false))?;
            statements.push(lvalue.write(value));
            Ok(statements)
        }
    }
}

/// Expression reading an identifier leaf after it was bound.
fn leaf_reference(context: &mut TransformationContext<'_>, target: &ts::Pattern, mode: BindingMode) -> lua::Expression {
    let name = target.as_identifier().unwrap_or_default();
    match (mode, Binding::from_pattern(context, target)) {
        (BindingMode::Declare, Some(binding)) => variable::binding_target(context, &binding),
        _ => identifier::transform_identifier_reference(context, target.id, name, target.span),
    }
}
