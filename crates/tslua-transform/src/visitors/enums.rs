//! Enums as tables with a reverse mapping for numeric members.
//!
//! ```lua
//! local Color = {}
//! Color.Red = 0
//! Color[Color.Red] = "Red"
//! Color.Name = "color"
//! ```

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{AnnotationKind, EnumDeclaration, EnumValue, SymbolId};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::identifier;
use super::variable::{self, Binding};

pub(crate) fn transform_enum_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Enum(declaration) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    if declaration.modifiers.declare {
        identifier::check_ambient_name(context, &declaration.name.name, declaration.name.span);
        return Ok(Vec::new());
    }

    let members = lower_member_values(context, declaration)?;
    if declaration.is_const {
        return Ok(Vec::new());
    }
    if ts::find_annotation(&declaration.annotations, AnnotationKind::CompileMembersOnly).is_some() {
        return Ok(members
            .into_iter()
            .map(|member| lua::Statement::assign_one(lua::Expression::identifier(member.name), member.value))
            .collect());
    }

    let binding = Binding {
        symbol: context.symbol_of(declaration.name.id),
        name: declaration.name.name.clone(),
        span: declaration.name.span,
    };
    let mut statements: Vec<lua::Statement> = variable::create_local_or_exported_or_global_declaration(
        context,
        std::slice::from_ref(&binding),
        vec![lua::Expression::table(Vec::new())],
    )?
    .into_iter()
    .map(|statement| statement.with_range(range))
    .collect();
    let table = variable::binding_target(context, &binding);

    for member in members {
        let field = lua::Expression::field(table.clone(), member.name.clone());
        statements.push(lua::Statement::assign_one(field.clone(), member.value).with_range(member.range));
        if member.numeric {
            statements.push(lua::Statement::assign_one(
                lua::Expression::table_index(table.clone(), field),
                lua::Expression::string(member.name),
            ));
        }
    }
    Ok(statements)
}

/// Value of `E.name` at a use site, for enums whose members are not kept in
/// a table.
pub(crate) fn transform_enum_member_access(
    context: &mut TransformationContext<'_>,
    symbol: SymbolId,
    name: &str,
) -> Option<lua::Expression> {
    let declaration = context.checker.enum_declaration(symbol)?;
    if ts::find_annotation(&declaration.annotations, AnnotationKind::CompileMembersOnly).is_some() {
        return Some(lua::Expression::identifier(name));
    }
    if !declaration.is_const {
        return None;
    }
    let value = context.checker.enum_member_value(symbol, name)?;
    Some(enum_value_expression(value))
}

struct LoweredMember {
    name: String,
    value: lua::Expression,
    numeric: bool,
    range: Option<lua::SourceRange>,
}

/// Values of all members in order. A member without an initializer takes
/// the previous numeric value plus one; following a string member or a
/// computed value it has none and is reported.
fn lower_member_values<'a>(
    context: &mut TransformationContext<'a>,
    declaration: &'a EnumDeclaration,
) -> Result<Vec<LoweredMember>, TransformError> {
    let values = context.checker.enum_values(declaration);
    let mut lowered = Vec::new();
    let mut previous_string = false;

    for (member, (_, value)) in declaration.members.iter().zip(values) {
        let range = lua_ast::range(member.span);
        let Some(name) = member.name.text() else {
            context.diagnose(
                member.name.span,
                DiagnosticCode::InvalidEnumMember,
                "Computed enum member names are not supported",
            );
            continue;
        };

        let (value, numeric) = match (value, &member.initializer) {
            (Some(value), _) => {
                let numeric = matches!(value, EnumValue::Number(_));
                previous_string = !numeric;
                (enum_value_expression(value), numeric)
            }
            (None, Some(initializer)) => {
                let numeric = context.checker.type_of(initializer).is_number();
                previous_string = !numeric;
                (context.transform_expression(initializer)?, numeric)
            }
            (None, None) if previous_string => {
                context.diagnose(
                    member.span,
                    DiagnosticCode::HeterogeneousEnum,
                    format!(
                        "Member '{}' of enum '{}' needs an initializer because it follows a string member",
                        name, declaration.name.name
                    ),
                );
                continue;
            }
            (None, None) => {
                context.diagnose(
                    member.span,
                    DiagnosticCode::InvalidEnumMember,
                    format!(
                        "Member '{}' of enum '{}' needs an initializer because it follows a computed member",
                        name, declaration.name.name
                    ),
                );
                continue;
            }
        };
        lowered.push(LoweredMember {
            name,
            value,
            numeric,
            range,
        });
    }
    Ok(lowered)
}

fn enum_value_expression(value: EnumValue) -> lua::Expression {
    match value {
        EnumValue::Number(value) => lua::Expression::number(value),
        EnumValue::String(value) => lua::Expression::string(value),
    }
}
