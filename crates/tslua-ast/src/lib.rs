//! Lua target AST.
//!
//! Nodes are built once, bottom-up, by the transformer and rendered by the
//! printer. Each node may carry the [`SourceRange`] of the TypeScript node it
//! was produced from.

mod ast;
mod builder;
mod identifier;
mod operators;

pub use ast::{
    Block, ElseBranch, Expression, ExpressionKind, FunctionExpression, Identifier, IfStatement,
    NodeFlags, SourceRange, Statement, StatementKind, TableField,
};
pub use identifier::{
    LUA_BUILTINS, LUA_KEYWORDS, fix_invalid_lua_identifier, is_lua_keyword, is_unsafe_name,
    is_valid_lua_identifier, luaify,
};
pub use operators::{BinaryOperator, UNARY_PRECEDENCE, UnaryOperator};

#[cfg(test)]
mod tests;
