//! Array methods.
//!
//! A few map directly onto `table` functions. The rest call lualib helpers
//! taking the array as first argument.

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
        "concat" => LuaLibFeature::ArrayConcat,
        "every" => LuaLibFeature::ArrayEvery,
        "filter" => LuaLibFeature::ArrayFilter,
        "find" => LuaLibFeature::ArrayFind,
        "findIndex" => LuaLibFeature::ArrayFindIndex,
        "flat" => LuaLibFeature::ArrayFlat,
        "flatMap" => LuaLibFeature::ArrayFlatMap,
        "forEach" => LuaLibFeature::ArrayForEach,
        "includes" => LuaLibFeature::ArrayIncludes,
        "indexOf" => LuaLibFeature::ArrayIndexOf,
        "join" => LuaLibFeature::ArrayJoin,
        "map" => LuaLibFeature::ArrayMap,
        "push" => LuaLibFeature::ArrayPush,
        "reduce" => LuaLibFeature::ArrayReduce,
        "reduceRight" => LuaLibFeature::ArrayReduceRight,
        "reverse" => LuaLibFeature::ArrayReverse,
        "slice" => LuaLibFeature::ArraySlice,
        "some" => LuaLibFeature::ArraySome,
        "sort" => LuaLibFeature::ArraySort,
        "splice" => LuaLibFeature::ArraySplice,
        "unshift" => LuaLibFeature::ArrayUnshift,
        _ => return None,
    })
}

pub(super) fn transform_array_call<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    let name = access.name.name.as_str();
    match name {
        "push" if is_single_value(&call.arguments) => transform_single_push(context, access, call).map(Some),
        "pop" | "shift" => {
            let (array, _) = receiver_and_arguments(context, access, call, false)?;
            let mut arguments = vec![array];
            if name == "shift" {
                arguments.push(lua::Expression::number(1.0));
            }
            Ok(Some(lua::Expression::call(lua::Expression::path("table.remove"), arguments)))
        }
        "join" if joins_natively(context, &access.object) => {
            let (array, arguments) = receiver_and_arguments(context, access, call, false)?;
            let separator = arguments
                .into_iter()
                .next()
                .unwrap_or_else(|| lua::Expression::string(","));
            Ok(Some(lua::Expression::call(
                lua::Expression::path("table.concat"),
                vec![array, separator],
            )))
        }
        _ => {
            let Some(feature) = lualib_feature(name) else {
                return Ok(None);
            };
            let (array, mut arguments) = receiver_and_arguments(context, access, call, false)?;
            arguments.insert(0, array);
            Ok(Some(context.transform_lualib_call(feature, arguments)))
        }
    }
}

fn is_single_value(arguments: &[ts::Expression]) -> bool {
    matches!(arguments, [argument] if !matches!(argument.kind, ts::ExpressionKind::Spread(_)))
}

/// `a.push(v)` writes `a[#a + 1] = v` in front and yields `#a`.
fn transform_single_push<'a>(
    context: &mut TransformationContext<'a>,
    access: &'a ts::PropertyAccess,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    let (array, arguments) = receiver_and_arguments(context, access, call, true)?;
    let value = arguments.into_iter().next().unwrap_or_else(lua::Expression::nil);
    let slot = lua::Expression::binary(
        lua_ast::length(array.clone()),
        BinaryOperator::Add,
        lua::Expression::number(1.0),
    );
    context.add_preceding_statement(lua::Statement::assign_one(
        lua::Expression::table_index(array.clone(), slot),
        value,
    ))?;
    Ok(lua_ast::length(array))
}

/// `table.concat` only accepts string and number elements.
fn joins_natively(context: &TransformationContext<'_>, array: &ts::Expression) -> bool {
    let element = context.checker.type_of(array).element_type();
    element.is_string() || element.is_number()
}
