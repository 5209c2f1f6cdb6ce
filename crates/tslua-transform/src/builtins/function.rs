//! `call`, `apply`, `bind` and `length` of function values.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{CallExpression, ContextType};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::receiver_and_arguments;

fn function_context(context: &TransformationContext<'_>, function: &ts::Expression) -> ContextType {
    context
        .checker
        .type_of(function)
        .signature()
        .map(|signature| signature.context)
        .unwrap_or(ContextType::NonVoid)
}

/// `f.call(t, a)` → `f(t, a)`, `f.apply(t, args)` and `f.bind(t, a)` through
/// lualib. Functions without a context parameter drop `t`.
pub(super) fn transform_function_call<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let name = access.name.name.as_str();
    if !matches!(name, "call" | "apply" | "bind") {
        return Ok(None);
    }
    let void = function_context(context, &access.object) == ContextType::Void;
    let (function, mut arguments) = receiver_and_arguments(context, access, call, false)?;
    if arguments.is_empty() {
        arguments.push(lua::Expression::nil());
    }

    let lowered = match (name, void) {
        ("call", false) => lua::Expression::call(function, arguments),
        ("call", true) => lua::Expression::call(function, arguments.split_off(1)),
        ("apply", false) => {
            arguments.insert(0, function);
            arguments.truncate(3);
            context.transform_lualib_call(LuaLibFeature::FunctionApply, arguments)
        }
        ("apply", true) => match arguments.into_iter().nth(1) {
            Some(list) => {
                let unpacked = lua_ast::create_unpack_call(context, list);
                lua::Expression::call(function, vec![unpacked])
            }
            None => lua::Expression::call(function, Vec::new()),
        },
        ("bind", false) => {
            arguments.insert(0, function);
            context.transform_lualib_call(LuaLibFeature::FunctionBind, arguments)
        }
        (_, true) if arguments.len() == 1 => function,
        _ => {
            context.diagnose(
                call.callee.span,
                DiagnosticCode::UnsupportedProperty,
                "Binding arguments of a function without a context parameter is not supported",
            );
            lua::Expression::call(lua::Expression::field(function, name), arguments)
        }
    };
    Ok(Some(lowered))
}

/// `f.length` → `debug.getinfo(f).nparams`, less the context parameter.
pub(super) fn transform_function_length<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
) -> Result<Option<lua::Expression>, TransformError> {
    if !context.options.lua_target.supports_nparams() {
        context.diagnose(
            access.name.span,
            DiagnosticCode::UnsupportedForTarget,
            format!(
                "function.length is not supported for target Lua {}",
                context.options.lua_target
            ),
        );
    }
    let void = function_context(context, &access.object) == ContextType::Void;
    let function = context.transform_expression(&access.object)?;
    let info = lua::Expression::call(lua::Expression::path("debug.getinfo"), vec![function]);
    let parameters = lua::Expression::field(info, "nparams");
    if void {
        return Ok(Some(parameters));
    }
    Ok(Some(lua::Expression::binary(
        parameters,
        BinaryOperator::Sub,
        lua::Expression::number(1.0),
    )))
}
