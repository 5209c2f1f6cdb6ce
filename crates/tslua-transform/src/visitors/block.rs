use rhizome_tslua_ast as lua;
use rhizome_tslua_syntax_typescript as ts;

use crate::context::{ScopeType, TransformationContext};
use crate::error::TransformError;
use crate::lua_ast;

/// `{ ... }` becomes `do ... end` so its locals stay scoped.
pub(crate) fn transform_block<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Block(statements) = &statement.kind else {
        return Ok(Vec::new());
    };
    let body = context.transform_scope_block(statements, ScopeType::Block)?;
    Ok(vec![
        lua::Statement::do_block(body).with_range(lua_ast::range(statement.span)),
    ])
}

pub(crate) fn transform_empty_statement<'a>(
    _statement: &'a ts::Statement,
    _context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    Ok(Vec::new())
}
