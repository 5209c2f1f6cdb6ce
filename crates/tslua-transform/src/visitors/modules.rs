//! `import` and `export` declarations.
//!
//! Imported bindings are not copied into locals. Each required module gets
//! one table local, and references read through it (`____m.a`), so live
//! bindings keep working.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{ExportDeclaration, Ident, ImportDeclaration};

use crate::context::TransformationContext;
use crate::error::TransformError;
use crate::lua_ast;

use super::identifier;

/// Lua module name for an import specifier: `./util/strings.ts` becomes
/// `util.strings`.
pub(crate) fn module_path(source: &str) -> String {
    let mut path = source;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix("../") {
            path = rest;
        } else {
            break;
        }
    }
    let path = [".d.ts", ".tsx", ".ts", ".lua"]
        .iter()
        .find_map(|extension| path.strip_suffix(extension))
        .unwrap_or(path);
    path.replace('/', ".")
}

fn require(path: &str) -> lua::Expression {
    lua::Expression::call(
        lua::Expression::identifier("require"),
        vec![lua::Expression::string(path)],
    )
}

pub(crate) fn transform_import_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Import(import) = &statement.kind else {
        return Ok(Vec::new());
    };
    if import.type_only {
        return Ok(Vec::new());
    }
    let range = lua_ast::range(statement.span);
    let path = module_path(&import.source);

    if is_side_effect_only(import) {
        return Ok(vec![lua::Statement::expression(require(&path)).with_range(range)]);
    }

    let mut statements = Vec::new();
    if let Some(namespace) = import.namespace.as_ref().filter(|ident| is_used(context, ident)) {
        let local = identifier::identifier_for_ident(context, namespace);
        statements.push(lua::Statement::local_one(local, Some(require(&path))).with_range(range));
    }

    let reads_table = import.default.as_ref().is_some_and(|ident| is_used(context, ident))
        || import.named.iter().any(|specifier| is_used(context, &specifier.local));
    if reads_table {
        let (table, new) = context.module_table(&path);
        if new {
            let declaration =
                lua::Statement::local_one(lua::Identifier::new(table), Some(require(&path))).with_range(range);
            context.current_scope_mut()?.import_statements.push(declaration);
        }
    }
    Ok(statements)
}

fn is_side_effect_only(import: &ImportDeclaration) -> bool {
    import.default.is_none() && import.namespace.is_none() && import.named.is_empty()
}

/// Whether an imported binding is read as a value anywhere in the file.
fn is_used(context: &TransformationContext<'_>, ident: &Ident) -> bool {
    context
        .symbol_of(ident.id)
        .is_some_and(|symbol| !context.checker.references(symbol).is_empty())
}

pub(crate) fn transform_export_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Export(export) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    let statements = match export {
        ExportDeclaration::Named { specifiers, source: None } => {
            let mut statements = Vec::new();
            for specifier in specifiers {
                let value = context.transform_expression(&specifier.local)?;
                statements.push(lua::Statement::assign_one(
                    lua::Expression::field(lua_ast::exports(), specifier.exported.clone()),
                    value,
                ));
            }
            statements
        }
        ExportDeclaration::Named {
            specifiers,
            source: Some(source),
        } => {
            let (table, new) = context.module_table(&module_path(source));
            let mut statements = Vec::new();
            if new {
                statements.push(lua::Statement::local_one(
                    lua::Identifier::new(table.clone()),
                    Some(require(&module_path(source))),
                ));
            }
            for specifier in specifiers {
                statements.push(lua::Statement::assign_one(
                    lua::Expression::field(lua_ast::exports(), specifier.exported.clone()),
                    lua::Expression::field(lua::Expression::identifier(table.clone()), specifier.local_name.clone()),
                ));
            }
            statements
        }
        ExportDeclaration::All { source } => vec![export_all(context, source)],
        ExportDeclaration::Default(value) => {
            let value = context.transform_expression(value)?;
            vec![lua::Statement::assign_one(
                lua::Expression::field(lua_ast::exports(), "default"),
                value,
            )]
        }
        ExportDeclaration::Assignment(value) => {
            let value = context.transform_expression(value)?;
            vec![lua::Statement::assign_one(lua_ast::exports(), value)]
        }
    };
    Ok(statements
        .into_iter()
        .map(|statement| statement.with_range(range))
        .collect())
}

/// Copy every export but `default` of another module.
///
/// ```lua
/// do
///     local ____export = require("m")
///     for ____exportKey, ____exportValue in pairs(____export) do
///         if ____exportKey ~= "default" then
///             ____exports[____exportKey] = ____exportValue
///         end
///     end
/// end
/// ```
fn export_all(context: &mut TransformationContext<'_>, source: &str) -> lua::Statement {
    let module = lua::Identifier::new(context.create_temp_name("export"));
    let key = lua::Identifier::new(context.create_temp_name("exportKey"));
    let value = lua::Identifier::new(context.create_temp_name("exportValue"));
    let copy = lua_ast::if_block(
        lua::Expression::binary(
            key.clone().into(),
            lua::BinaryOperator::Ne,
            lua::Expression::string("default"),
        ),
        vec![lua::Statement::assign_one(
            lua::Expression::table_index(lua_ast::exports(), key.clone().into()),
            value.clone().into(),
        )],
    );
    let pairs = lua::Expression::call(lua::Expression::identifier("pairs"), vec![module.clone().into()]);
    lua::Statement::do_block(vec![
        lua::Statement::local_one(module, Some(require(&module_path(source)))),
        lua::Statement::for_in(vec![key, value], vec![pairs], lua::Block::new(vec![copy])),
    ])
}
