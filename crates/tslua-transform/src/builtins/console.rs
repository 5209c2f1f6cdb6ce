//! `console` output through `print`.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript::CallExpression;

use crate::context::TransformationContext;
use crate::error::TransformError;

use super::arguments;

/// `console.log(a, b)` → `print(a, b)`, for every log level.
pub(super) fn transform_console_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<Option<lua::Expression>, TransformError> {
    match name {
        "log" | "info" | "warn" | "error" | "debug" => {
            let arguments = arguments(context, call)?;
            Ok(Some(lua::Expression::call(lua::Expression::identifier("print"), arguments)))
        }
        _ => Ok(None),
    }
}
