//! Literals, `this`, and array and object constructors.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::BinaryOperator;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{ObjectMemberKind, PropertyName, PropertyNameKind};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::{function, spread};

pub(crate) fn transform_numeric_literal<'a>(
    expression: &'a ts::Expression,
    _context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Number(value) = expression.kind else {
        return Ok(None);
    };
    Ok(Some(
        lua::Expression::number(value).with_range(lua_ast::range(expression.span)),
    ))
}

pub(crate) fn transform_string_literal<'a>(
    expression: &'a ts::Expression,
    _context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::String(value) = &expression.kind else {
        return Ok(None);
    };
    Ok(Some(
        lua::Expression::string(value.clone()).with_range(lua_ast::range(expression.span)),
    ))
}

/// `a${b}c` becomes `"a" .. tostring(b) .. "c"`. Strings and numbers are
/// concatenated without conversion.
pub(crate) fn transform_template_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Template(template) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    let values = spread::transform_ordered_expressions(context, &template.expressions)?;

    let mut parts: Vec<lua::Expression> = Vec::new();
    let mut values = values.into_iter();
    for (index, quasi) in template.quasis.iter().enumerate() {
        if !quasi.is_empty() {
            parts.push(lua::Expression::string(quasi.clone()));
        }
        if let (Some(source), Some(value)) = (template.expressions.get(index), values.next()) {
            let ty = context.checker.type_of(source);
            parts.push(lua_ast::wrap_in_to_string(value, &ty));
        }
    }

    let single = parts.len() == 1;
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Ok(Some(lua::Expression::string("").with_range(range)));
    };
    // A lone number still has to come out as a string.
    let first = if single && first.as_string().is_none() && !is_to_string_call(&first) {
        lua::Expression::call(lua::Expression::identifier("tostring"), vec![first])
    } else {
        first
    };
    let result = parts.fold(first, |left, right| {
        lua::Expression::binary(left, BinaryOperator::Concat, right)
    });
    Ok(Some(result.with_range(range)))
}

fn is_to_string_call(expression: &lua::Expression) -> bool {
    match &expression.kind {
        lua::ExpressionKind::Call { callee, .. } => callee
            .as_identifier()
            .is_some_and(|identifier| identifier.text == "tostring"),
        _ => false,
    }
}

pub(crate) fn transform_boolean_literal<'a>(
    expression: &'a ts::Expression,
    _context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Boolean(value) = expression.kind else {
        return Ok(None);
    };
    Ok(Some(
        lua::Expression::boolean(value).with_range(lua_ast::range(expression.span)),
    ))
}

/// `null`, `undefined` and array holes.
pub(crate) fn transform_nil_literal<'a>(
    expression: &'a ts::Expression,
    _context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    Ok(Some(
        lua::Expression::nil().with_range(lua_ast::range(expression.span)),
    ))
}

/// `this` is the `self` parameter, or the class table in static field
/// initializers.
pub(crate) fn transform_this_keyword<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let range = lua_ast::range(expression.span);
    if let Some(frame) = context.current_class() {
        if frame.static_initializer {
            return Ok(Some(frame.reference.clone().with_range(range)));
        }
    }
    Ok(Some(
        lua::Expression::identifier(lua_ast::SELF).with_range(range),
    ))
}

pub(crate) fn transform_array_literal<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Array(elements) = &expression.kind else {
        return Ok(None);
    };
    let array = spread::transform_array_elements(context, elements)?;
    Ok(Some(array.with_range(lua_ast::range(expression.span))))
}

/// Object literals become table constructors. Spread members split the
/// literal into segments merged by `__TS__ObjectAssign`.
pub(crate) fn transform_object_literal<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Object(members) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);

    let mut lowered: Vec<(Vec<lua::Statement>, ObjectPart)> = Vec::new();
    for member in members {
        let part = context.with_preceding_frame(|context| transform_object_member(context, member))?;
        lowered.push(part);
    }

    // Members evaluate left to right; values before the last member that
    // needed helper statements are cached so they keep their order.
    let last_with_statements = lowered.iter().rposition(|(statements, _)| !statements.is_empty());
    let mut segments: Vec<lua::Expression> = Vec::new();
    let mut fields: Vec<lua::TableField> = Vec::new();
    for (index, (statements, part)) in lowered.into_iter().enumerate() {
        context.add_preceding_statements(statements)?;
        let cache = last_with_statements.is_some_and(|last| index < last);
        match part {
            ObjectPart::Skipped => {}
            ObjectPart::Field { key, value } => {
                let value = if cache {
                    context.move_to_preceding_temp(value, None)?
                } else {
                    value
                };
                fields.push(lua::TableField::keyed(key, value));
            }
            ObjectPart::Spread(value) => {
                if !fields.is_empty() || segments.is_empty() {
                    segments.push(lua::Expression::table(std::mem::take(&mut fields)));
                }
                let value = if cache {
                    context.move_to_preceding_temp(value, None)?
                } else {
                    value
                };
                segments.push(value);
            }
        }
    }

    if segments.is_empty() {
        return Ok(Some(lua::Expression::table(fields).with_range(range)));
    }
    if !fields.is_empty() {
        segments.push(lua::Expression::table(fields));
    }
    Ok(Some(
        context
            .transform_lualib_call(LuaLibFeature::ObjectAssign, segments)
            .with_range(range),
    ))
}

enum ObjectPart {
    Field {
        key: lua::Expression,
        value: lua::Expression,
    },
    Spread(lua::Expression),
    Skipped,
}

fn transform_object_member<'a>(
    context: &mut TransformationContext<'a>,
    member: &'a ts::ObjectMember,
) -> Result<ObjectPart, TransformError> {
    match &member.kind {
        ObjectMemberKind::Property { key, value } => {
            let key = transform_property_name(context, key)?;
            let value = context.transform_expression(value)?;
            Ok(ObjectPart::Field { key, value })
        }
        ObjectMemberKind::Shorthand(value) => {
            let name = value.as_identifier().unwrap_or_default();
            let key = lua::Expression::string(name);
            let value = context.transform_expression(value)?;
            Ok(ObjectPart::Field { key, value })
        }
        ObjectMemberKind::Method { key, function } => {
            let key = transform_property_name(context, key)?;
            let value = function::transform_function_like(context, function, Default::default())?;
            Ok(ObjectPart::Field { key, value })
        }
        ObjectMemberKind::Accessor { .. } => {
            context.diagnose(
                member.span,
                DiagnosticCode::UnsupportedAccessorInObjectLiteral,
                "Accessors in object literals are not supported",
            );
            Ok(ObjectPart::Skipped)
        }
        ObjectMemberKind::Spread(value) => {
            let value = context.transform_expression(value)?;
            Ok(ObjectPart::Spread(value))
        }
    }
}

/// Table key for a property name: a string, a number, or a computed value.
pub(crate) fn transform_property_name<'a>(
    context: &mut TransformationContext<'a>,
    name: &'a PropertyName,
) -> Result<lua::Expression, TransformError> {
    let range = lua_ast::range(name.span);
    Ok(match &name.kind {
        PropertyNameKind::Identifier(text) | PropertyNameKind::String(text) => {
            lua::Expression::string(text.clone()).with_range(range)
        }
        PropertyNameKind::Number(value) => lua::Expression::number(*value).with_range(range),
        PropertyNameKind::Computed(expression) => context.transform_expression(expression)?,
    })
}
