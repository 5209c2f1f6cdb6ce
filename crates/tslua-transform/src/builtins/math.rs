//! `Math` onto Lua's `math` library.

use std::f64::consts;

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_syntax_typescript::CallExpression;

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::options::LuaTarget;

use super::arguments;

pub(super) fn transform_math_property(name: &str) -> Option<lua::Expression> {
    let value = match name {
        "PI" => return Some(lua::Expression::path("math.pi")),
        "E" => consts::E,
        "LN2" => consts::LN_2,
        "LN10" => consts::LN_10,
        "LOG2E" => consts::LOG2_E,
        "LOG10E" => consts::LOG10_E,
        "SQRT1_2" => consts::FRAC_1_SQRT_2,
        "SQRT2" => consts::SQRT_2,
        _ => return None,
    };
    Some(lua::Expression::number(value))
}

pub(super) fn transform_math_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let lowered = match name {
        "abs" | "ceil" | "floor" | "max" | "min" | "sqrt" | "sin" | "cos" | "tan" | "asin" | "acos" | "exp"
        | "log" | "atan" => {
            let arguments = arguments(context, call)?;
            lua::Expression::call(lua::Expression::path(&format!("math.{}", name)), arguments)
        }
        "random" => lua::Expression::call(lua::Expression::path("math.random"), Vec::new()),
        // math.floor(x + 0.5)
        "round" => {
            let mut arguments = arguments(context, call)?;
            let value = take_first(&mut arguments);
            let shifted = lua::Expression::binary(value, BinaryOperator::Add, lua::Expression::number(0.5));
            lua::Expression::call(lua::Expression::path("math.floor"), vec![shifted])
        }
        "pow" => {
            let mut arguments = arguments(context, call)?.into_iter();
            let base = arguments.next().unwrap_or_else(lua::Expression::nil);
            let exponent = arguments.next().unwrap_or_else(lua::Expression::nil);
            lua::Expression::binary(base, BinaryOperator::Pow, exponent)
        }
        "atan2" => {
            let arguments = arguments(context, call)?;
            let function = match context.options.lua_target {
                LuaTarget::Lua53 | LuaTarget::Lua54 => "math.atan",
                _ => "math.atan2",
            };
            lua::Expression::call(lua::Expression::path(function), arguments)
        }
        _ => return Ok(None),
    };
    Ok(Some(lowered))
}

fn take_first(arguments: &mut Vec<lua::Expression>) -> lua::Expression {
    if arguments.is_empty() {
        lua::Expression::nil()
    } else {
        arguments.remove(0)
    }
}
