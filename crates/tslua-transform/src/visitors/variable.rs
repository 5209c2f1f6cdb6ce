//! `let`, `const` and `var` declarations, and where declared names live.

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{Span, SymbolId, VariableKind};

use crate::context::TransformationContext;
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::{call, destructuring, identifier};

/// A name introduced by a declaration.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub symbol: Option<SymbolId>,
    pub name: String,
    pub span: Span,
}

impl Binding {
    pub(crate) fn from_pattern(context: &TransformationContext<'_>, pattern: &ts::Pattern) -> Option<Self> {
        let name = pattern.as_identifier()?;
        Some(Self {
            symbol: context.symbol_of(pattern.id),
            name: name.to_string(),
            span: pattern.span,
        })
    }
}

enum Storage {
    Local,
    Exported,
    Namespace(SymbolId),
    Global,
}

fn storage(context: &TransformationContext<'_>, binding: &Binding) -> Storage {
    if let Some(symbol) = binding.symbol {
        if let Some(namespace) = context.checker.member_namespace(symbol) {
            return Storage::Namespace(namespace);
        }
        if context.checker.symbol(symbol).exported && context.is_module {
            return Storage::Exported;
        }
    }
    if context.is_global_scope() {
        Storage::Global
    } else {
        Storage::Local
    }
}

/// Expression naming a declared binding once it exists.
pub(crate) fn binding_target(context: &mut TransformationContext<'_>, binding: &Binding) -> lua::Expression {
    let range = lua_ast::range(binding.span);
    match storage(context, binding) {
        Storage::Exported => lua::Expression::field(lua_ast::exports(), binding.name.clone()).with_range(range),
        Storage::Namespace(namespace) => {
            let table = identifier::transform_identifier_for_symbol(context, namespace, binding.span);
            lua::Expression::field(table, binding.name.clone()).with_range(range)
        }
        Storage::Global | Storage::Local => {
            identifier::create_local_identifier(context, binding.symbol, &binding.name, binding.span).into()
        }
    }
}

/// Declare `bindings` with `values`.
///
/// Locals become `local` declarations, except hoisted ones whose `local` was
/// already emitted at the top of the block. Exported names, namespace
/// members and script globals are assigned to their tables.
pub(crate) fn create_local_or_exported_or_global_declaration(
    context: &mut TransformationContext<'_>,
    bindings: &[Binding],
    values: Vec<lua::Expression>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut locals: Vec<lua::Identifier> = Vec::new();
    let mut targets: Vec<lua::Expression> = Vec::new();
    for binding in bindings {
        match storage(context, binding) {
            Storage::Local => {
                let identifier =
                    identifier::create_local_identifier(context, binding.symbol, &binding.name, binding.span);
                let hoisted = binding.symbol.is_some_and(|symbol| context.is_hoisted(symbol));
                if hoisted {
                    let scope = context.current_scope_mut()?;
                    if !scope
                        .hoisted_identifiers
                        .iter()
                        .any(|existing| existing.text == identifier.text)
                    {
                        scope.hoisted_identifiers.push(identifier.clone());
                    }
                } else {
                    locals.push(identifier.clone());
                }
                targets.push(identifier.into());
            }
            _ => targets.push(binding_target(context, binding)),
        }
    }

    if values.is_empty() {
        if locals.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![lua::Statement::local(locals, Vec::new())]);
    }
    if locals.len() == bindings.len() {
        return Ok(vec![lua::Statement::local(locals, values)]);
    }
    if locals.is_empty() {
        return Ok(vec![lua::Statement::assign(targets, values)]);
    }
    Ok(vec![
        lua::Statement::local(locals, Vec::new()),
        lua::Statement::assign(targets, values),
    ])
}

pub(crate) fn transform_variable_statement<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Variable(variable) = &statement.kind else {
        return Ok(Vec::new());
    };
    transform_variable_declarations(context, variable, statement.span)
}

/// Lower the declarators of a variable statement, each with its own helper
/// statements in front of it.
pub(crate) fn transform_variable_declarations<'a>(
    context: &mut TransformationContext<'a>,
    variable: &'a ts::VariableStatement,
    span: Span,
) -> Result<Vec<lua::Statement>, TransformError> {
    if variable.modifiers.declare {
        for declarator in &variable.declarations {
            for name in declarator.name.bound_names() {
                if let Some(text) = name.as_identifier() {
                    identifier::check_ambient_name(context, text, name.span);
                }
            }
        }
        return Ok(Vec::new());
    }
    if variable.kind == VariableKind::Var {
        context.diagnose(
            span,
            DiagnosticCode::UnsupportedVarDeclaration,
            "`var` declarations are lowered as `let`; use `let` or `const` instead",
        );
    }

    let mut result = Vec::new();
    for declarator in &variable.declarations {
        let (preceding, statements) =
            context.with_preceding_frame(|context| transform_declarator(context, declarator))?;
        result.extend(preceding);
        let range = lua_ast::range(declarator.span);
        result.extend(statements.into_iter().map(|statement| match statement.range {
            Some(_) => statement,
            None => statement.with_range(range),
        }));
    }
    Ok(result)
}

fn transform_declarator<'a>(
    context: &mut TransformationContext<'a>,
    declarator: &'a ts::VariableDeclarator,
) -> Result<Vec<lua::Statement>, TransformError> {
    let Some(binding) = Binding::from_pattern(context, &declarator.name) else {
        let Some(initializer) = &declarator.initializer else {
            return Ok(Vec::new());
        };
        return destructuring::transform_variable_destructuring(context, &declarator.name, initializer);
    };

    let Some(initializer) = &declarator.initializer else {
        return create_local_or_exported_or_global_declaration(context, &[binding], Vec::new());
    };

    if let (Some(annotation), Some(symbol)) = (&declarator.type_annotation, binding.symbol) {
        let no_self = context.checker.symbol(symbol).no_self;
        let to = context.checker.type_from_node(annotation, no_self);
        let from = context.checker.type_of(initializer);
        call::validate_function_conversion(context, initializer.span, &from, &to);
    }

    if is_self_referencing(context, &binding, initializer) {
        // `local f = function() f() end` would not see `f`.
        let declared = create_local_or_exported_or_global_declaration(context, &[binding.clone()], Vec::new())?;
        let (preceding, value) =
            context.with_preceding_frame(|context| context.transform_expression(initializer))?;
        let target = binding_target(context, &binding);
        let mut statements = declared;
        statements.extend(preceding);
        statements.push(lua::Statement::assign_one(target, value));
        return Ok(statements);
    }

    let value = context.transform_expression(initializer)?;
    create_local_or_exported_or_global_declaration(context, &[binding], vec![value])
}

/// Whether a local's initializer refers to the local itself, as recursive
/// function values do.
fn is_self_referencing(context: &TransformationContext<'_>, binding: &Binding, initializer: &ts::Expression) -> bool {
    let Some(symbol) = binding.symbol else {
        return false;
    };
    if !matches!(storage(context, binding), Storage::Local) || context.is_hoisted(symbol) {
        return false;
    }
    context
        .checker
        .reference_spans(symbol)
        .iter()
        .any(|span| span.start >= initializer.span.start && span.end <= initializer.span.end)
}
