//! String methods over Lua's `string` library. JavaScript indices are
//! zero-based, Lua's one-based, so positions are shifted on the way in.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::CallExpression;

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;

use super::receiver_and_arguments;

fn lualib_feature(name: &str) -> Option<LuaLibFeature> {
    Some(match name {
        "endsWith" => LuaLibFeature::StringEndsWith,
        "includes" => LuaLibFeature::StringIncludes,
        "padEnd" => LuaLibFeature::StringPadEnd,
        "padStart" => LuaLibFeature::StringPadStart,
        "replace" => LuaLibFeature::StringReplace,
        "split" => LuaLibFeature::StringSplit,
        "startsWith" => LuaLibFeature::StringStartsWith,
        "trim" => LuaLibFeature::StringTrim,
        _ => return None,
    })
}

fn string_function(name: &str, arguments: Vec<lua::Expression>) -> lua::Expression {
    lua::Expression::call(lua::Expression::path(&format!("string.{}", name)), arguments)
}

pub(super) fn transform_string_call<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let name = access.name.name.as_str();
    let lowered = match name {
        "toUpperCase" | "toLowerCase" => {
            let (string, _) = receiver_and_arguments(context, access, call, false)?;
            let function = if name == "toUpperCase" { "upper" } else { "lower" };
            string_function(function, vec![string])
        }
        "toString" | "valueOf" => receiver_and_arguments(context, access, call, false)?.0,
        "charAt" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let index = first(arguments, 0.0);
            let index = context.move_to_preceding_temp(index, None)?;
            string_function(
                "sub",
                vec![
                    string,
                    lua_ast::add_to_numeric_expression(index.clone(), 1.0),
                    lua_ast::add_to_numeric_expression(index, 1.0),
                ],
            )
        }
        "charCodeAt" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let index = first(arguments, 0.0);
            string_function("byte", vec![string, lua_ast::add_to_numeric_expression(index, 1.0)])
        }
        // string.sub(s, start + 1, end)
        "substring" | "slice" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let mut arguments = arguments.into_iter();
            let start = arguments.next().unwrap_or_else(|| lua::Expression::number(0.0));
            let mut sub = vec![string, lua_ast::add_to_numeric_expression(start, 1.0)];
            sub.extend(arguments.next());
            string_function("sub", sub)
        }
        // string.sub(s, start + 1, start + length)
        "substr" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let mut arguments = arguments.into_iter();
            let start = arguments.next().unwrap_or_else(|| lua::Expression::number(0.0));
            match arguments.next() {
                Some(length) => {
                    let start = context.move_to_preceding_temp(start, None)?;
                    let end = lua::Expression::binary(start.clone(), BinaryOperator::Add, length);
                    string_function("sub", vec![string, lua_ast::add_to_numeric_expression(start, 1.0), end])
                }
                None => string_function("sub", vec![string, lua_ast::add_to_numeric_expression(start, 1.0)]),
            }
        }
        "repeat" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let mut rep = vec![string];
            rep.extend(arguments.into_iter().next());
            string_function("rep", rep)
        }
        // (string.find(s, x, start + 1, true) or 0) - 1
        "indexOf" => {
            let (string, arguments) = receiver_and_arguments(context, access, call, false)?;
            let mut arguments = arguments.into_iter();
            let search = arguments.next().unwrap_or_else(lua::Expression::nil);
            let start = match arguments.next() {
                Some(position) => {
                    let position = lua::Expression::binary(position, BinaryOperator::Or, lua::Expression::number(0.0));
                    lua::Expression::binary(
                        lua::Expression::parenthesized(position),
                        BinaryOperator::Add,
                        lua::Expression::number(1.0),
                    )
                }
                None => lua::Expression::number(1.0),
            };
            let find = string_function("find", vec![string, search, start, lua::Expression::boolean(true)]);
            let found = lua::Expression::binary(find, BinaryOperator::Or, lua::Expression::number(0.0));
            lua::Expression::binary(
                lua::Expression::parenthesized(found),
                BinaryOperator::Sub,
                lua::Expression::number(1.0),
            )
        }
        _ => {
            let Some(feature) = lualib_feature(name) else {
                return Ok(None);
            };
            let (string, mut arguments) = receiver_and_arguments(context, access, call, false)?;
            arguments.insert(0, string);
            context.transform_lualib_call(feature, arguments)
        }
    };
    Ok(Some(lowered))
}

fn first(arguments: Vec<lua::Expression>, default: f64) -> lua::Expression {
    arguments
        .into_iter()
        .next()
        .unwrap_or_else(|| lua::Expression::number(default))
}
