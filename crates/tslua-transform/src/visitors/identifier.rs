//! Identifier references and the Lua names declarations bind.

use rhizome_tslua_ast as lua;
use rhizome_tslua_lualib::LuaLibFeature;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{ImportedName, NodeId, Origin, Span, SymbolId};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::modules::module_path;

pub(crate) fn transform_identifier_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Identifier(name) = &expression.kind else {
        return Ok(None);
    };
    Ok(Some(transform_identifier_reference(
        context,
        expression.id,
        name,
        expression.span,
    )))
}

/// Lower a reference to `name` made by the node `node`.
pub(crate) fn transform_identifier_reference(
    context: &mut TransformationContext<'_>,
    node: NodeId,
    name: &str,
    span: Span,
) -> lua::Expression {
    match context.symbol_of(node) {
        Some(symbol) => transform_identifier_for_symbol(context, symbol, span),
        None => transform_unresolved_identifier(context, name, span),
    }
}

/// How a reference to `symbol` reads in the output: a local, an export, a
/// namespace member or a field of a required module.
pub(crate) fn transform_identifier_for_symbol(
    context: &mut TransformationContext<'_>,
    symbol: SymbolId,
    span: Span,
) -> lua::Expression {
    let range = lua_ast::range(span);
    let checker = context.checker;
    let info = checker.symbol(symbol);

    if info.origin == Origin::Prelude {
        return lua::Identifier::new(info.name.clone())
            .with_range(range)
            .into();
    }

    if let Some((source, imported)) = checker.import_of(symbol) {
        match imported {
            ImportedName::Namespace => {}
            ImportedName::Default => {
                let (table, _) = context.module_table(&module_path(source));
                return lua::Expression::field(lua::Expression::identifier(table), "default")
                    .with_range(range);
            }
            ImportedName::Named(export) => {
                let (table, _) = context.module_table(&module_path(source));
                return lua::Expression::field(lua::Expression::identifier(table), export)
                    .with_range(range);
            }
        }
    }

    if let Some(namespace) = checker.member_namespace(symbol) {
        let table = transform_identifier_for_symbol(context, namespace, span);
        return lua::Expression::field(table, info.name.clone()).with_range(range);
    }

    if info.exported && context.is_module {
        return lua::Expression::field(lua_ast::exports(), info.name.clone()).with_range(range);
    }

    create_local_identifier(context, Some(symbol), &info.name, span).into()
}

fn transform_unresolved_identifier(
    context: &mut TransformationContext<'_>,
    name: &str,
    span: Span,
) -> lua::Expression {
    let range = lua_ast::range(span);
    if let Some(feature) = LuaLibFeature::from_global(name) {
        context.import_lualib_feature(feature);
        return lua::Expression::identifier(name).with_range(range);
    }
    match name {
        "globalThis" => return lua::Expression::identifier("_G").with_range(range),
        "undefined" => return lua::Expression::nil().with_range(range),
        "NaN" => return lua::Expression::number(f64::NAN).with_range(range),
        "Infinity" => return lua::Expression::number(f64::INFINITY).with_range(range),
        _ => {}
    }
    if !lua::is_valid_lua_identifier(name) {
        context.diagnose(
            span,
            DiagnosticCode::InvalidIdentifierName,
            format!("Invalid ambient identifier name '{}'", name),
        );
        return lua::Expression::identifier(lua::fix_invalid_lua_identifier(name)).with_range(range);
    }
    lua::Expression::identifier(name).with_range(range)
}

/// Name a binding is declared under. Names Lua cannot hold, or that would
/// shadow a global the output relies on, are renamed unless the binding is
/// ambient.
pub(crate) fn create_local_identifier(
    context: &TransformationContext<'_>,
    symbol: Option<SymbolId>,
    name: &str,
    span: Span,
) -> lua::Identifier {
    let ambient = symbol.is_some_and(|symbol| context.checker.symbol(symbol).ambient);
    let mut identifier = if lua::is_unsafe_name(name) && !ambient {
        let mut renamed = lua::Identifier::new(lua::fix_invalid_lua_identifier(name));
        renamed.original_name = Some(name.to_string());
        renamed
    } else {
        lua::Identifier::new(name)
    };
    identifier.symbol_id = symbol.map(|symbol| symbol.0);
    identifier.range = lua_ast::range(span);
    identifier
}

/// Local identifier for a declared name node.
pub(crate) fn identifier_for_ident(
    context: &TransformationContext<'_>,
    ident: &ts::Ident,
) -> lua::Identifier {
    let symbol = context.symbol_of(ident.id);
    create_local_identifier(context, symbol, &ident.name, ident.span)
}

/// Ambient declarations keep their names, so names Lua cannot express are
/// reported.
pub(crate) fn check_ambient_name(context: &mut TransformationContext<'_>, name: &str, span: Span) {
    if !lua::is_valid_lua_identifier(name) {
        context.diagnose(
            span,
            DiagnosticCode::InvalidIdentifierName,
            format!("Invalid ambient identifier name '{}'", name),
        );
    }
}
