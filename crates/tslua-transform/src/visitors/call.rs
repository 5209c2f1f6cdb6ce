//! Calls and `new` expressions.
//!
//! A function whose context type is non-void takes its receiver as first
//! argument: `obj.m(a)` becomes `obj:m(a)`, and a plain `f(a)` passes `nil`
//! (or `_G` outside strict mode). Void functions are called as written.

use std::rc::Rc;

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{
    AnnotationKind, CallExpression, ContextType, FunctionType, ImportedName, Span, Type,
};

use crate::builtins;
use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::{access, class, spread};

pub(crate) fn transform_call_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Call(call) = &expression.kind else {
        return Ok(None);
    };
    if let Some(chained) = access::transform_optional_chain(context, expression)? {
        return Ok(Some(chained));
    }

    let range = lua_ast::range(expression.span);
    if context.checker.is_multi_helper_call(call) {
        context.diagnose(
            expression.span,
            DiagnosticCode::InvalidMultiFunctionUse,
            "The $multi function can only be used as the value of a return statement",
        );
        let values = spread::transform_expression_list(context, &call.arguments, true)?;
        return Ok(Some(lua::Expression::array(values).with_range(range)));
    }

    let lowered = transform_call_unwrapped(context, expression, call)?;
    if context.checker.returns_multi(call) {
        return Ok(Some(lowered.wrap_in_table()));
    }
    Ok(Some(lowered))
}

/// Lower a call, leaving multi-value results as value lists.
pub(crate) fn transform_call_unwrapped<'a>(
    context: &mut TransformationContext<'a>,
    expression: &'a ts::Expression,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    let range = lua_ast::range(expression.span);
    let callee = call.callee.skip_outer();
    let lowered = match &callee.kind {
        ts::ExpressionKind::Super => class::transform_super_call(context, call)?,
        ts::ExpressionKind::PropertyAccess(access)
            if matches!(access.object.skip_outer().kind, ts::ExpressionKind::Super) =>
        {
            class::transform_super_method_call(context, &access.name.name, call)?
        }
        ts::ExpressionKind::PropertyAccess(access) => {
            match builtins::transform_builtin_call(context, expression, call)? {
                Some(lowered) => lowered,
                None => transform_property_call(context, call, callee, access)?,
            }
        }
        ts::ExpressionKind::ElementAccess(access) => {
            transform_element_call(context, call, callee, access)?
        }
        _ => match builtins::transform_builtin_call(context, expression, call)? {
            Some(lowered) => lowered,
            None => transform_plain_call(context, call)?,
        },
    };
    Ok(lowered.with_range(range))
}

/// Context type of the function a call invokes. Callees without a known
/// signature are assumed to take `self`.
pub(crate) fn callee_context(context: &TransformationContext<'_>, call: &CallExpression) -> ContextType {
    context
        .checker
        .type_of(&call.callee)
        .signature()
        .map(|signature| signature.context)
        .unwrap_or(ContextType::NonVoid)
}

/// Argument passed for `self` when a non-void function is called without a
/// receiver.
pub(crate) fn context_argument(context: &TransformationContext<'_>) -> lua::Expression {
    if context.options.strict {
        lua::Expression::nil()
    } else {
        lua::Expression::identifier("_G")
    }
}

fn transform_plain_call<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    let signature = context.checker.type_of(&call.callee).signature();
    let (function, mut arguments) =
        transform_receiver_and_arguments(context, &call.callee, &call.arguments, false, signature)?;
    if callee_context(context, call) == ContextType::NonVoid {
        arguments.insert(0, context_argument(context));
    }
    Ok(lua::Expression::call(function, arguments))
}

fn transform_property_call<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
    callee: &'a ts::Expression,
    access: &'a ts::PropertyAccess,
) -> Result<lua::Expression, TransformError> {
    let signature = context.checker.type_of(&call.callee).signature();
    let function_context = callee_context(context, call);

    if is_namespace_like(context, &access.object) || function_context == ContextType::Void {
        let (function, mut arguments) =
            transform_receiver_and_arguments(context, callee, &call.arguments, false, signature)?;
        if function_context == ContextType::NonVoid {
            arguments.insert(0, context_argument(context));
        }
        return Ok(lua::Expression::call(function, arguments));
    }

    let name = access.name.name.as_str();
    let needs_cache = !lua::is_valid_lua_identifier(name);
    let (receiver, arguments) = transform_receiver_and_arguments(
        context,
        &access.object,
        &call.arguments,
        needs_cache,
        signature,
    )?;
    Ok(create_method_call(receiver, name, arguments))
}

fn transform_element_call<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
    callee: &'a ts::Expression,
    access: &'a ts::ElementAccess,
) -> Result<lua::Expression, TransformError> {
    let signature = context.checker.type_of(&call.callee).signature();
    if callee_context(context, call) == ContextType::Void {
        let (function, arguments) =
            transform_receiver_and_arguments(context, callee, &call.arguments, false, signature)?;
        return Ok(lua::Expression::call(function, arguments));
    }

    let object_type = context.checker.type_of(&access.object);
    let receiver = context.transform_expression(&access.object)?;
    let receiver = context.move_to_preceding_temp(receiver, Some(&access.object))?;
    let index = context.transform_expression(&access.index)?;
    let index = access::adjust_index(context, &object_type, &access.index, index);
    let (statements, mut arguments) = context.with_preceding_frame(|context| {
        transform_arguments(context, &call.arguments, signature)
    })?;
    let index = if statements.is_empty() {
        index
    } else {
        context.move_to_preceding_temp(index, Some(&access.index))?
    };
    context.add_preceding_statements(statements)?;
    arguments.insert(0, receiver.clone());
    Ok(lua::Expression::call(
        lua::Expression::table_index(receiver, index),
        arguments,
    ))
}

/// Call a function value already read from `callee`, passing `receiver` as
/// `self` when the callee takes one.
pub(crate) fn transform_call_through<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
    callee: &'a ts::Expression,
    function: lua::Expression,
    receiver: lua::Expression,
) -> Result<lua::Expression, TransformError> {
    let signature = context.checker.type_of(&call.callee).signature();
    let mut arguments = transform_arguments(context, &call.arguments, signature)?;
    if callee_context(context, call) == ContextType::NonVoid {
        let this = match &callee.kind {
            ts::ExpressionKind::PropertyAccess(access) if is_namespace_like(context, &access.object) => {
                context_argument(context)
            }
            _ => receiver,
        };
        arguments.insert(0, this);
    }
    let lowered = lua::Expression::call(function, arguments);
    if context.checker.returns_multi(call) {
        return Ok(lowered.wrap_in_table());
    }
    Ok(lowered)
}

/// `receiver:name(arguments)`, or `receiver["name"](receiver, arguments)`
/// when `name` cannot be written after a colon. The receiver must already be
/// safe to evaluate twice in that case.
pub(crate) fn create_method_call(
    receiver: lua::Expression,
    name: &str,
    mut arguments: Vec<lua::Expression>,
) -> lua::Expression {
    if lua::is_valid_lua_identifier(name) {
        return lua::Expression::method_call(receiver, name, arguments);
    }
    arguments.insert(0, receiver.clone());
    lua::Expression::call(
        lua::Expression::table_index(receiver, lua::Expression::string(name)),
        arguments,
    )
}

/// Lower `first` then the arguments, in source order. `first` is cached
/// when the arguments need helper statements or when `cache_first` is set.
pub(crate) fn transform_receiver_and_arguments<'a>(
    context: &mut TransformationContext<'a>,
    first: &'a ts::Expression,
    arguments: &'a [ts::Expression],
    cache_first: bool,
    signature: Option<Rc<FunctionType>>,
) -> Result<(lua::Expression, Vec<lua::Expression>), TransformError> {
    let value = context.transform_expression(first)?;
    let (statements, arguments) = context.with_preceding_frame(|context| {
        transform_arguments(context, arguments, signature)
    })?;
    let value = if cache_first || !statements.is_empty() {
        context.move_to_preceding_temp(value, Some(first))?
    } else {
        value
    };
    context.add_preceding_statements(statements)?;
    Ok((value, arguments))
}

/// Lower call arguments and check function values passed to parameters of
/// a different context type.
pub(crate) fn transform_arguments<'a>(
    context: &mut TransformationContext<'a>,
    arguments: &'a [ts::Expression],
    signature: Option<Rc<FunctionType>>,
) -> Result<Vec<lua::Expression>, TransformError> {
    if let Some(signature) = signature {
        for (index, argument) in arguments.iter().enumerate() {
            if matches!(argument.kind, ts::ExpressionKind::Spread(_)) {
                continue;
            }
            let from = context.checker.type_of(argument);
            validate_function_conversion(context, argument.span, &from, &signature.param(index));
        }
    }
    spread::transform_expression_list(context, arguments, false)
}

/// Report assigning a function to a slot expecting the other context type.
pub(crate) fn validate_function_conversion(
    context: &mut TransformationContext<'_>,
    span: Span,
    from: &Type,
    to: &Type,
) {
    let (Some(from), Some(to)) = (from.signature(), to.signature()) else {
        return;
    };
    match (from.context, to.context) {
        (ContextType::NonVoid, ContextType::Void) => context.diagnose(
            span,
            DiagnosticCode::UnsupportedSelfFunctionConversion,
            "Unable to convert function with a 'this' parameter to function with no 'this'. \
             Wrap it in an arrow function, or declare it with 'this: void'.",
        ),
        (ContextType::Void, ContextType::NonVoid) => context.diagnose(
            span,
            DiagnosticCode::UnsupportedNoSelfFunctionConversion,
            "Unable to convert function with no 'this' parameter to function with 'this'. \
             Wrap it in an arrow function, or declare it with 'this: any'.",
        ),
        _ => {}
    }
}

/// Namespaces, enums and `import * as` bindings are plain tables of free
/// functions.
fn is_namespace_like(context: &TransformationContext<'_>, object: &ts::Expression) -> bool {
    match context.checker.type_of(object) {
        Type::Namespace(_) | Type::Enum(_) => return true,
        _ => {}
    }
    context
        .symbol_of(object.skip_outer().id)
        .and_then(|symbol| context.checker.import_of(symbol))
        .is_some_and(|(_, imported)| matches!(imported, ImportedName::Namespace))
}

/// `new C(a)` becomes `C.new(true, a)`.
pub(crate) fn transform_new_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::New(new) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    let callee = new.callee.skip_outer();

    if let Some(name) = callee.as_identifier() {
        if context.symbol_of(callee.id).is_none() && matches!(name, "Array" | "Object") {
            let values = if name == "Array" && new.arguments.len() > 1 {
                spread::transform_expression_list(context, &new.arguments, false)?
            } else {
                Vec::new()
            };
            return Ok(Some(lua::Expression::array(values).with_range(range)));
        }
    }

    if let Type::Class(class) = context.checker.type_of(callee) {
        let custom = context.checker.class_declaration(class).and_then(|declaration| {
            ts::find_annotation(&declaration.annotations, AnnotationKind::CustomConstructor)
        });
        if let Some(annotation) = custom {
            let Some(constructor) = annotation.args.first() else {
                context.diagnose(
                    expression.span,
                    DiagnosticCode::UnsupportedKind,
                    "@customConstructor expects the name of a constructor function",
                );
                return Ok(Some(lua::Expression::nil().with_range(range)));
            };
            let arguments = transform_arguments(context, &new.arguments, None)?;
            return Ok(Some(
                lua::Expression::call(lua::Expression::path(constructor), arguments)
                    .with_range(range),
            ));
        }
    }

    let (class, mut arguments) =
        transform_receiver_and_arguments(context, &new.callee, &new.arguments, false, None)?;
    arguments.insert(0, lua::Expression::boolean(true));
    Ok(Some(
        lua::Expression::call(lua::Expression::field(class, "new"), arguments).with_range(range),
    ))
}
