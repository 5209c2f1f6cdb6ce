//! JavaScript standard library calls and properties, mapped onto Lua's own
//! library or onto lualib helpers.
//!
//! Each family returns `None` for members it does not know. Calls on known
//! builtin objects report those as unsupported and then lower as ordinary
//! calls.

mod array;
mod console;
mod function;
mod math;
mod object;
mod string;

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{CallExpression, Span, Type};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

/// Lower a call whose callee is a builtin function or method, if it is one.
pub(crate) fn transform_builtin_call<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    if call.optional {
        return Ok(None);
    }
    let callee = call.callee.skip_outer();
    let access = match &callee.kind {
        ts::ExpressionKind::Identifier(name) if context.symbol_of(callee.id).is_none() => {
            return object::transform_global_call(context, name, call);
        }
        ts::ExpressionKind::PropertyAccess(access) if !access.optional => access,
        _ => return Ok(None),
    };

    let name = access.name.name.as_str();
    let object_type = context.checker.type_of(&access.object).non_nullable();
    let (owner, lowered) = match &object_type {
        Type::Named(owner, _) => {
            let lowered = match owner.as_str() {
                "Math" => math::transform_math_call(context, name, call)?,
                "console" => console::transform_console_call(context, name, call)?,
                "ObjectConstructor" => object::transform_object_call(context, name, call)?,
                "ArrayConstructor" => object::transform_array_constructor_call(context, name, call)?,
                "NumberConstructor" => object::transform_number_call(context, name, call)?,
                "StringConstructor" => object::transform_string_constructor_call(context, name, call)?,
                _ => return Ok(None),
            };
            (display_owner(owner), lowered)
        }
        ty if ty.is_array() => ("Array", array::transform_array_call(context, access, call)?),
        ty if ty.is_string() => ("String", string::transform_string_call(context, access, call)?),
        ty if ty.is_function() => return function::transform_function_call(context, access, call),
        _ => return Ok(None),
    };

    if lowered.is_none() {
        unsupported_property(context, expression.span, owner, name);
    }
    Ok(lowered)
}

/// Lower a builtin property read such as `Math.PI` or `a.length`.
pub(crate) fn transform_builtin_property<'a>(
    context: &mut TransformationContext<'a>,
    _expression: &'a ts::Expression,
    access: &'a ts::PropertyAccess,
) -> Result<Option<lua::Expression>, TransformError> {
    if access.optional {
        return Ok(None);
    }
    let name = access.name.name.as_str();
    let object_type = context.checker.type_of(&access.object).non_nullable();
    match &object_type {
        Type::Named(owner, _) if owner == "Math" => Ok(math::transform_math_property(name)),
        ty if name == "length" && (ty.is_array() || ty.is_string()) => {
            let object = context.transform_expression(&access.object)?;
            Ok(Some(lua_ast::length(object)))
        }
        ty if name == "length" && ty.is_function() => function::transform_function_length(context, access),
        _ => Ok(None),
    }
}

fn display_owner(owner: &str) -> &str {
    owner.strip_suffix("Constructor").unwrap_or(owner)
}

fn unsupported_property(context: &mut TransformationContext<'_>, span: Span, owner: &str, name: &str) {
    context.diagnose(
        span,
        DiagnosticCode::UnsupportedProperty,
        format!("Unsupported property on {}: {}", owner, name),
    );
}

/// Lowered arguments of `call`, in order.
fn arguments<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
) -> Result<Vec<lua::Expression>, TransformError> {
    crate::visitors::call::transform_arguments(context, &call.arguments, None)
}

/// Lowered receiver of a method call followed by its arguments. With
/// `cache`, the receiver is moved to a temp so it can be used twice.
fn receiver_and_arguments<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
    call: &'a CallExpression,
    cache: bool,
) -> Result<(lua::Expression, Vec<lua::Expression>), TransformError> {
    crate::visitors::call::transform_receiver_and_arguments(context, &access.object, &call.arguments, cache, None)
}
