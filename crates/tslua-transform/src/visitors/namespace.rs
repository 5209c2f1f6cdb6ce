//! `namespace N {}` as a table that merged declarations share.
//!
//! ```lua
//! local N = N or {}
//! do
//!     N.x = 1
//!     local y = 2
//! end
//! ```

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::NamespaceDeclaration;

use crate::context::{ScopeType, TransformationContext};
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::identifier;
use super::variable::{self, Binding};

pub(crate) fn transform_namespace_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Namespace(namespace) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    if namespace.modifiers.declare {
        if lua::is_valid_lua_identifier(&namespace.name.name) {
            identifier::check_ambient_name(context, &namespace.name.name, namespace.name.span);
        }
        return Ok(Vec::new());
    }
    if namespace.name.name.starts_with(['"', '\'']) {
        context.diagnose(
            namespace.name.span,
            DiagnosticCode::UnsupportedNamespace,
            "Module declarations with a string name must be ambient",
        );
        return Ok(Vec::new());
    }
    if namespace.name.name.contains('.') {
        context.diagnose(
            namespace.name.span,
            DiagnosticCode::UnsupportedNamespace,
            "Dotted namespace names are not supported, nest the namespaces instead",
        );
        return Ok(Vec::new());
    }
    if !is_instantiated(namespace) {
        return Ok(Vec::new());
    }

    let binding = Binding {
        symbol: context.symbol_of(namespace.name.id),
        name: namespace.name.name.clone(),
        span: namespace.name.span,
    };
    let existing = variable::binding_target(context, &binding);
    let merged = lua::Expression::binary(existing, lua::BinaryOperator::Or, lua::Expression::table(Vec::new()));
    let mut statements =
        variable::create_local_or_exported_or_global_declaration(context, std::slice::from_ref(&binding), vec![merged])?;

    let body = context.transform_scope_block(&namespace.body, ScopeType::Block)?;
    statements.push(lua::Statement::do_block(body));
    Ok(statements
        .into_iter()
        .map(|statement| statement.with_range(range))
        .collect())
}

/// Whether the namespace declares any value. Namespaces holding only types
/// produce no table.
fn is_instantiated(namespace: &NamespaceDeclaration) -> bool {
    namespace.body.iter().any(|statement| match &statement.kind {
        ts::StatementKind::Interface(_) | ts::StatementKind::TypeAlias(_) => false,
        ts::StatementKind::Namespace(inner) => !inner.modifiers.declare && is_instantiated(inner),
        ts::StatementKind::Enum(declaration) => !declaration.modifiers.declare && !declaration.is_const,
        ts::StatementKind::Variable(variable) => !variable.modifiers.declare,
        ts::StatementKind::Class(class) => !class.modifiers.declare,
        ts::StatementKind::Function(declaration) => declaration.function.body.is_some(),
        ts::StatementKind::Empty => false,
        _ => true,
    })
}
