//! Standard lowering rules, one module per family of source constructs.

mod access;
mod assignment;
mod async_await;
mod binary;
mod block;
pub(crate) mod call;
mod class;
mod compound;
mod conditional;
mod destructuring;
mod enums;
mod errors;
mod expression_statement;
mod function;
mod identifier;
mod literal;
mod loops;
mod modules;
mod namespace;
pub(crate) mod spread;
mod switch;
mod tuple;
mod typescript;
mod unary;
mod variable;

use std::sync::OnceLock;

use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript::SyntaxKind;

use crate::context::{ScopeType, TransformationContext, VisitorMap};
use crate::error::TransformError;
use crate::lua_ast;

/// Visitors for every construct the transpiler lowers.
///
/// Overrides are layered by cloning this map and registering on top of it.
pub fn standard_visitors() -> &'static VisitorMap {
    static VISITORS: OnceLock<VisitorMap> = OnceLock::new();
    VISITORS.get_or_init(build_standard_visitors)
}

fn build_standard_visitors() -> VisitorMap {
    let mut map = VisitorMap::new();

    map.register_statement(
        SyntaxKind::VariableStatement,
        "variable_statement",
        variable::transform_variable_statement,
    );
    map.register_statement(
        SyntaxKind::FunctionDeclaration,
        "function_declaration",
        function::transform_function_declaration,
    );
    map.register_statement(
        SyntaxKind::ClassDeclaration,
        "class_declaration",
        class::transform_class_declaration,
    );
    map.register_statement(
        SyntaxKind::EnumDeclaration,
        "enum_declaration",
        enums::transform_enum_declaration,
    );
    map.register_statement(
        SyntaxKind::InterfaceDeclaration,
        "interface_declaration",
        typescript::transform_type_declaration,
    );
    map.register_statement(
        SyntaxKind::TypeAliasDeclaration,
        "type_alias_declaration",
        typescript::transform_type_declaration,
    );
    map.register_statement(
        SyntaxKind::ModuleDeclaration,
        "module_declaration",
        namespace::transform_namespace_declaration,
    );
    map.register_statement(
        SyntaxKind::ImportDeclaration,
        "import_declaration",
        modules::transform_import_declaration,
    );
    map.register_statement(
        SyntaxKind::ExportDeclaration,
        "export_declaration",
        modules::transform_export_declaration,
    );
    map.register_statement(
        SyntaxKind::ExpressionStatement,
        "expression_statement",
        expression_statement::transform_expression_statement,
    );
    map.register_statement(
        SyntaxKind::IfStatement,
        "if_statement",
        conditional::transform_if_statement,
    );
    map.register_statement(
        SyntaxKind::WhileStatement,
        "while_statement",
        loops::transform_while_statement,
    );
    map.register_statement(SyntaxKind::DoStatement, "do_statement", loops::transform_do_statement);
    map.register_statement(
        SyntaxKind::ForStatement,
        "for_statement",
        loops::transform_for_statement,
    );
    map.register_statement(
        SyntaxKind::ForOfStatement,
        "for_of_statement",
        loops::transform_for_of_statement,
    );
    map.register_statement(
        SyntaxKind::ForInStatement,
        "for_in_statement",
        loops::transform_for_in_statement,
    );
    map.register_statement(
        SyntaxKind::ReturnStatement,
        "return_statement",
        function::transform_return_statement,
    );
    map.register_statement(
        SyntaxKind::BreakStatement,
        "break_statement",
        loops::transform_break_statement,
    );
    map.register_statement(
        SyntaxKind::ContinueStatement,
        "continue_statement",
        loops::transform_continue_statement,
    );
    map.register_statement(
        SyntaxKind::ThrowStatement,
        "throw_statement",
        errors::transform_throw_statement,
    );
    map.register_statement(
        SyntaxKind::TryStatement,
        "try_statement",
        errors::transform_try_statement,
    );
    map.register_statement(
        SyntaxKind::SwitchStatement,
        "switch_statement",
        switch::transform_switch_statement,
    );
    map.register_statement(SyntaxKind::Block, "block", block::transform_block);
    map.register_statement(
        SyntaxKind::LabeledStatement,
        "labeled_statement",
        loops::transform_labeled_statement,
    );
    map.register_statement(
        SyntaxKind::EmptyStatement,
        "empty_statement",
        block::transform_empty_statement,
    );

    map.register_expression(
        SyntaxKind::Identifier,
        "identifier",
        identifier::transform_identifier_expression,
    );
    map.register_expression(
        SyntaxKind::NumericLiteral,
        "numeric_literal",
        literal::transform_numeric_literal,
    );
    map.register_expression(
        SyntaxKind::StringLiteral,
        "string_literal",
        literal::transform_string_literal,
    );
    map.register_expression(
        SyntaxKind::TemplateExpression,
        "template_expression",
        literal::transform_template_expression,
    );
    map.register_expression(
        SyntaxKind::TrueKeyword,
        "true_keyword",
        literal::transform_boolean_literal,
    );
    map.register_expression(
        SyntaxKind::FalseKeyword,
        "false_keyword",
        literal::transform_boolean_literal,
    );
    map.register_expression(
        SyntaxKind::NullKeyword,
        "null_keyword",
        literal::transform_nil_literal,
    );
    map.register_expression(
        SyntaxKind::UndefinedKeyword,
        "undefined_keyword",
        literal::transform_nil_literal,
    );
    map.register_expression(
        SyntaxKind::ThisKeyword,
        "this_keyword",
        literal::transform_this_keyword,
    );
    map.register_expression(
        SyntaxKind::SuperKeyword,
        "super_keyword",
        class::transform_super_keyword,
    );
    map.register_expression(
        SyntaxKind::ArrayLiteralExpression,
        "array_literal",
        literal::transform_array_literal,
    );
    map.register_expression(
        SyntaxKind::ObjectLiteralExpression,
        "object_literal",
        literal::transform_object_literal,
    );
    map.register_expression(
        SyntaxKind::FunctionExpression,
        "function_expression",
        function::transform_function_expression,
    );
    map.register_expression(
        SyntaxKind::ArrowFunction,
        "arrow_function",
        function::transform_function_expression,
    );
    map.register_expression(
        SyntaxKind::ClassExpression,
        "class_expression",
        class::transform_class_expression,
    );
    map.register_expression(
        SyntaxKind::CallExpression,
        "call_expression",
        call::transform_call_expression,
    );
    map.register_expression(
        SyntaxKind::NewExpression,
        "new_expression",
        call::transform_new_expression,
    );
    map.register_expression(
        SyntaxKind::PropertyAccessExpression,
        "property_access",
        access::transform_property_access_expression,
    );
    map.register_expression(
        SyntaxKind::ElementAccessExpression,
        "element_access",
        access::transform_element_access_expression,
    );
    map.register_expression(
        SyntaxKind::BinaryExpression,
        "binary_expression",
        binary::transform_binary_expression,
    );
    map.register_expression(
        SyntaxKind::PrefixUnaryExpression,
        "prefix_unary",
        unary::transform_prefix_unary_expression,
    );
    map.register_expression(
        SyntaxKind::PostfixUnaryExpression,
        "postfix_unary",
        compound::transform_postfix_update_expression,
    );
    map.register_expression(
        SyntaxKind::TypeOfExpression,
        "typeof_expression",
        unary::transform_typeof_expression,
    );
    map.register_expression(
        SyntaxKind::VoidExpression,
        "void_expression",
        unary::transform_void_expression,
    );
    map.register_expression(
        SyntaxKind::DeleteExpression,
        "delete_expression",
        unary::transform_delete_expression,
    );
    map.register_expression(
        SyntaxKind::ConditionalExpression,
        "conditional_expression",
        conditional::transform_conditional_expression,
    );
    map.register_expression(
        SyntaxKind::ParenthesizedExpression,
        "parenthesized_expression",
        typescript::transform_transparent_expression,
    );
    map.register_expression(
        SyntaxKind::AsExpression,
        "as_expression",
        typescript::transform_transparent_expression,
    );
    map.register_expression(
        SyntaxKind::AwaitExpression,
        "await_expression",
        async_await::transform_await_expression,
    );
    map.register_expression(
        SyntaxKind::YieldExpression,
        "yield_expression",
        async_await::transform_yield_expression,
    );
    map.register_expression(
        SyntaxKind::CommaListExpression,
        "comma_list",
        binary::transform_comma_list_expression,
    );
    map.register_expression(
        SyntaxKind::SpreadElement,
        "spread_element",
        spread::transform_spread_element,
    );
    map.register_expression(
        SyntaxKind::OmittedExpression,
        "omitted_expression",
        literal::transform_nil_literal,
    );

    map
}

/// Lower the whole file held by `context`.
///
/// Modules collect their exports in `____exports`, which the chunk returns.
pub(crate) fn transform_source_file(
    context: &mut TransformationContext<'_>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let file = context.file;
    context.push_scope(ScopeType::File);
    context.plan_block(&file.statements)?;
    let body = context.transform_statements(&file.statements);
    let scope = context.pop_scope()?;
    let body = body?;

    let mut statements = Vec::new();
    if context.is_module {
        statements.push(lua::Statement::local_one(
            lua::Identifier::new(lua_ast::EXPORTS),
            Some(lua::Expression::table(Vec::new())),
        ));
    }
    statements.extend(scope.finish(body));
    if context.is_module {
        statements.push(lua::Statement::ret(vec![lua_ast::exports()]));
    }
    Ok(statements)
}
