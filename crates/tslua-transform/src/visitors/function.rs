//! Functions, parameters and `return`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::NodeFlags;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::ContextType;

use crate::context::{ScopeType, TransformationContext};
use crate::error::TransformError;
use crate::lua_ast;

use super::destructuring::{self, BindingMode};
use super::identifier::{self, create_local_identifier};
use super::variable::{self, Binding};
use super::{spread, tuple};

/// Name of the context parameter of arrow functions, which must not shadow
/// the `self` they capture.
const ARROW_SELF: &str = "____";

/// Options for lowering a function body.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FunctionExtras {
    /// Overrides the checker's context type, as methods and constructors do.
    pub context: Option<ContextType>,
    /// Emit `self.p = p` for constructor parameter properties.
    pub parameter_properties: bool,
}

/// Lower a function into a Lua function expression.
pub(crate) fn transform_function_like<'a>(
    context: &mut TransformationContext<'a>,
    function: &'a ts::Function,
    extras: FunctionExtras,
) -> Result<lua::Expression, TransformError> {
    let range = lua_ast::range(function.span);
    let function_context = extras
        .context
        .unwrap_or_else(|| context.checker.function_context(function));

    context.push_scope(ScopeType::Function);
    {
        let multi_return = context.checker.is_multi_return_function(function);
        let scope = context.current_scope_mut()?;
        scope.function = Some(function.id);
        scope.is_async = function.is_async;
        scope.is_generator = function.is_generator;
        scope.multi_return = multi_return;
    }
    let lowered = lower_function(context, function, function_context, extras);
    let scope = context.pop_scope()?;
    let (params, dots, prologue, body, inline) = lowered?;

    let mut statements = prologue;
    let body = scope.finish(body);
    let inline = inline && statements.is_empty();
    if function.is_async {
        let wrapped = lua::Expression::function(Vec::new(), false, lua::Block::new(body), NodeFlags::empty());
        let awaiter = context.transform_lualib_call(LuaLibFeature::AsyncAwaiter, vec![wrapped]);
        statements.push(lua::Statement::ret(vec![awaiter]));
    } else if function.is_generator {
        let wrapped = lua::Expression::function(Vec::new(), false, lua::Block::new(body), NodeFlags::empty());
        let generator = context.transform_lualib_call(LuaLibFeature::Generator, vec![wrapped]);
        statements.push(lua::Statement::ret(vec![generator]));
    } else {
        statements.extend(body);
    }

    let flags = if inline {
        NodeFlags::INLINE
    } else {
        NodeFlags::empty()
    };
    Ok(lua::Expression::function(params, dots, lua::Block::new(statements), flags).with_range(range))
}

type LoweredFunction = (
    Vec<lua::Identifier>,
    bool,
    Vec<lua::Statement>,
    Vec<lua::Statement>,
    bool,
);

fn lower_function<'a>(
    context: &mut TransformationContext<'a>,
    function: &'a ts::Function,
    function_context: ContextType,
    extras: FunctionExtras,
) -> Result<LoweredFunction, TransformError> {
    if let Some(ts::FunctionBody::Block(statements)) = &function.body {
        context.plan_block(statements)?;
    }

    let mut params = Vec::new();
    if function_context == ContextType::NonVoid {
        let name = if function.is_arrow {
            ARROW_SELF
        } else {
            lua_ast::SELF
        };
        params.push(lua::Identifier::new(name));
    }

    let mut dots = false;
    let mut prologue = Vec::new();
    for parameter in &function.params {
        if parameter.rest {
            dots = true;
            prologue.extend(transform_rest_parameter(context, function, parameter)?);
            continue;
        }
        let name = match &parameter.pattern.kind {
            ts::PatternKind::Identifier(name) => {
                let symbol = context.symbol_of(parameter.pattern.id);
                create_local_identifier(context, symbol, name, parameter.pattern.span)
            }
            _ => lua::Identifier::new(context.create_temp_name("bindingPattern")),
        };
        params.push(name.clone());
        if let Some(default) = &parameter.default {
            prologue.push(transform_parameter_default(context, name.clone(), default)?);
        }
        if !matches!(parameter.pattern.kind, ts::PatternKind::Identifier(_)) {
            prologue.extend(destructuring::transform_binding_pattern(
                context,
                &parameter.pattern,
                name.clone().into(),
                BindingMode::Declare,
            )?);
        }
        if extras.parameter_properties && parameter.is_property {
            if let Some(property) = parameter.pattern.as_identifier() {
                prologue.push(lua::Statement::assign_one(
                    lua::Expression::field(lua::Expression::identifier(lua_ast::SELF), property),
                    name.into(),
                ));
            }
        }
    }

    let (body, inline) = match &function.body {
        Some(ts::FunctionBody::Block(statements)) => (context.transform_statements(statements)?, false),
        Some(ts::FunctionBody::Expression(expression)) => {
            let (mut statements, values) = context
                .with_preceding_frame(|context| tuple::transform_return_values(context, expression))?;
            let inline = statements.is_empty();
            statements.push(lua::Statement::ret(values).with_range(lua_ast::range(expression.span)));
            (statements, inline)
        }
        None => (Vec::new(), false),
    };
    Ok((params, dots, prologue, body, inline))
}

/// `local rest = {...}`, skipped when every use of the rest parameter is a
/// spread that can forward `...` directly.
fn transform_rest_parameter<'a>(
    context: &mut TransformationContext<'a>,
    function: &'a ts::Function,
    parameter: &'a ts::Parameter,
) -> Result<Vec<lua::Statement>, TransformError> {
    let varargs = lua::Expression::array(vec![lua::Expression::dots()]);
    match &parameter.pattern.kind {
        ts::PatternKind::Identifier(name) => {
            let symbol = context.symbol_of(parameter.pattern.id);
            let forwarded = symbol.is_some_and(|symbol| {
                let Some(scope) = context.function_scope() else {
                    return false;
                };
                scope.hoisted_function_count() == 0
                    && !function.is_async
                    && !function.is_generator
                    && spread::is_rest_only_spread(context, function, symbol)
            });
            if forwarded {
                return Ok(Vec::new());
            }
            let name = create_local_identifier(context, symbol, name, parameter.pattern.span);
            Ok(vec![lua::Statement::local_one(name, Some(varargs))])
        }
        _ => {
            let temp = lua::Identifier::new(context.create_temp_name("rest"));
            let mut statements = vec![lua::Statement::local_one(temp.clone(), Some(varargs))];
            statements.extend(destructuring::transform_binding_pattern(
                context,
                &parameter.pattern,
                temp.into(),
                BindingMode::Declare,
            )?);
            Ok(statements)
        }
    }
}

/// `if p == nil then p = default end`, with the default's helper statements
/// inside the branch.
fn transform_parameter_default<'a>(
    context: &mut TransformationContext<'a>,
    name: lua::Identifier,
    default: &'a ts::Expression,
) -> Result<lua::Statement, TransformError> {
    let (mut statements, value) =
        context.with_preceding_frame(|context| context.transform_expression(default))?;
    let target: lua::Expression = name.into();
    statements.push(lua::Statement::assign_one(target.clone(), value));
    Ok(lua_ast::if_block(lua_ast::is_nil(target), statements))
}

pub(crate) fn transform_function_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Function(declaration) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    if declaration.function.body.is_none() {
        if let (true, Some(name)) = (declaration.modifiers.declare, &declaration.name) {
            identifier::check_ambient_name(context, &name.name, name.span);
        }
        return Ok(Vec::new());
    }

    let function = transform_function_like(context, &declaration.function, FunctionExtras::default())?
        .with_flags(NodeFlags::DECLARATION);

    let Some(name) = &declaration.name else {
        // `export default function () {}`
        return Ok(vec![
            lua::Statement::assign_one(lua::Expression::field(lua_ast::exports(), "default"), function)
                .with_range(range),
        ]);
    };
    let symbol = context.symbol_of(name.id);
    let binding = Binding {
        symbol,
        name: name.name.clone(),
        span: name.span,
    };

    let hoisted = symbol.is_some_and(|symbol| context.is_hoisted(symbol));
    let statements = if hoisted {
        let statements =
            variable::create_local_or_exported_or_global_declaration(context, &[binding], vec![function])?;
        let scope = context.current_scope_mut()?;
        scope.hoisted_functions.extend(statements);
        Vec::new()
    } else {
        variable::create_local_or_exported_or_global_declaration(context, &[binding], vec![function])?
    };
    let mut statements: Vec<lua::Statement> = statements
        .into_iter()
        .map(|statement| statement.with_range(range))
        .collect();

    if declaration.modifiers.export && declaration.modifiers.default {
        if let Some(symbol) = symbol {
            let local = identifier::transform_identifier_for_symbol(context, symbol, name.span);
            statements.push(lua::Statement::assign_one(
                lua::Expression::field(lua_ast::exports(), "default"),
                local,
            ));
        }
    }
    Ok(statements)
}

pub(crate) fn transform_function_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Function(function) = &expression.kind else {
        return Ok(None);
    };
    Ok(Some(transform_function_like(context, function, FunctionExtras::default())?))
}

/// `return e`. Inside a try or catch body the value is returned through the
/// protected call as `true, e`.
pub(crate) fn transform_return_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Return(value) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    let mut values = match value {
        Some(value) => tuple::transform_return_values(context, value)?,
        None => Vec::new(),
    };
    if mark_try_return(context) {
        values.insert(0, lua::Expression::boolean(true));
    }
    Ok(vec![lua::Statement::ret(values).with_range(range)])
}

/// Record a return in the innermost try or catch body of the current
/// function, if there is one.
pub(crate) fn mark_try_return(context: &mut TransformationContext<'_>) -> bool {
    let Some(scope) = context.find_scope_mut(&[ScopeType::Function, ScopeType::Try, ScopeType::Catch])
    else {
        return false;
    };
    if scope.kind == ScopeType::Function {
        return false;
    }
    scope.try_has_return = true;
    true
}
