//! Global conversion functions and the static members of `Object`,
//! `Array`, `Number` and `String`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript::CallExpression;

use crate::context::TransformationContext;
use crate::error::TransformError;

use super::arguments;

/// `String(x)` → `tostring(x)`, `Number(x)` → `tonumber(x)`.
pub(super) fn transform_global_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let function = match name {
        "String" => "tostring",
        "Number" | "parseFloat" => "tonumber",
        _ => return Ok(None),
    };
    if call.arguments.is_empty() {
        return Ok(Some(match name {
            "String" => lua::Expression::string(""),
            _ => lua::Expression::number(0.0),
        }));
    }
    let mut arguments = arguments(context, call)?;
    arguments.truncate(1);
    Ok(Some(lua::Expression::call(lua::Expression::identifier(function), arguments)))
}

pub(super) fn transform_object_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let feature = match name {
        "keys" => LuaLibFeature::ObjectKeys,
        "values" => LuaLibFeature::ObjectValues,
        "entries" => LuaLibFeature::ObjectEntries,
        "assign" => LuaLibFeature::ObjectAssign,
        _ => return Ok(None),
    };
    let arguments = arguments(context, call)?;
    Ok(Some(context.transform_lualib_call(feature, arguments)))
}

pub(super) fn transform_array_constructor_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    match name {
        "isArray" => {
            let arguments = arguments(context, call)?;
            Ok(Some(context.transform_lualib_call(LuaLibFeature::ArrayIsArray, arguments)))
        }
        // `Array.of(a, b)` → `{a, b}`
        "of" => {
            let arguments = arguments(context, call)?;
            Ok(Some(lua::Expression::array(arguments)))
        }
        // `Array.from(iterable)` → `{__TS__Spread(iterable)}`
        "from" if call.arguments.len() == 1 => {
            let arguments = arguments(context, call)?;
            let spread = context.transform_lualib_call(LuaLibFeature::Spread, arguments);
            Ok(Some(lua::Expression::array(vec![spread])))
        }
        _ => Ok(None),
    }
}

pub(super) fn transform_number_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    match name {
        // NaN is the only value not equal to itself.
        "isNaN" => {
            let value = arguments(context, call)?
                .into_iter()
                .next()
                .unwrap_or_else(lua::Expression::nil);
            let value = context.move_to_preceding_temp(value, call.arguments.first())?;
            Ok(Some(lua::Expression::binary(value.clone(), BinaryOperator::Ne, value)))
        }
        "parseFloat" => {
            let mut arguments = arguments(context, call)?;
            arguments.truncate(1);
            Ok(Some(lua::Expression::call(lua::Expression::identifier("tonumber"), arguments)))
        }
        _ => Ok(None),
    }
}

/// `String.fromCharCode(...)` → `string.char(...)`.
pub(super) fn transform_string_constructor_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    if name != "fromCharCode" {
        return Ok(None);
    }
    let arguments = arguments(context, call)?;
    Ok(Some(lua::Expression::call(lua::Expression::path("string.char"), arguments)))
}
