//! Shorthand constructors for building Lua trees bottom-up.

use crate::ast::{
    Block, ElseBranch, Expression, ExpressionKind, FunctionExpression, Identifier, IfStatement,
    NodeFlags, Statement, StatementKind, TableField,
};
use crate::operators::{BinaryOperator, UnaryOperator};

impl Expression {
    pub fn nil() -> Self {
        Self::new(ExpressionKind::Nil)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ExpressionKind::Boolean(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(ExpressionKind::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExpressionKind::String(value.into()))
    }

    pub fn dots() -> Self {
        Self::new(ExpressionKind::Dots)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Identifier::new(name).into()
    }

    pub fn table(fields: Vec<TableField>) -> Self {
        Self::new(ExpressionKind::Table(fields))
    }

    /// Array-style table constructor.
    pub fn array(values: Vec<Expression>) -> Self {
        Self::table(values.into_iter().map(TableField::positional).collect())
    }

    pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
        Self::new(ExpressionKind::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Self::new(ExpressionKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn parenthesized(inner: Expression) -> Self {
        Self::new(ExpressionKind::Parenthesized(Box::new(inner)))
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn method_call(
        receiver: Expression,
        name: impl Into<String>,
        arguments: Vec<Expression>,
    ) -> Self {
        Self::new(ExpressionKind::MethodCall {
            receiver: Box::new(receiver),
            name: name.into(),
            arguments,
        })
    }

    pub fn table_index(table: Expression, index: Expression) -> Self {
        Self::new(ExpressionKind::TableIndex {
            table: Box::new(table),
            index: Box::new(index),
        })
    }

    /// `table.field` with a string key.
    pub fn field(table: Expression, name: impl Into<String>) -> Self {
        Self::table_index(table, Self::string(name))
    }

    /// Dotted global path such as `string.sub`.
    pub fn path(path: &str) -> Self {
        let mut parts = path.split('.');
        let mut expression = Self::identifier(parts.next().unwrap_or_default());
        for part in parts {
            expression = Self::field(expression, part);
        }
        expression
    }

    pub fn function(params: Vec<Identifier>, dots: bool, body: Block, flags: NodeFlags) -> Self {
        Self::new(ExpressionKind::Function(FunctionExpression { params, dots, body })).with_flags(flags)
    }

    /// Wrap in a single-element table, `{ expr }`.
    pub fn wrap_in_table(self) -> Self {
        let range = self.range;
        Self::array(vec![self]).with_range(range)
    }
}

impl TableField {
    pub fn positional(value: Expression) -> Self {
        Self { key: None, value }
    }

    pub fn keyed(key: Expression, value: Expression) -> Self {
        Self {
            key: Some(key),
            value,
        }
    }
}

impl Statement {
    pub fn local(left: Vec<Identifier>, right: Vec<Expression>) -> Self {
        Self::new(StatementKind::VariableDeclaration { left, right })
    }

    pub fn local_one(name: Identifier, value: Option<Expression>) -> Self {
        Self::local(vec![name], value.into_iter().collect())
    }

    pub fn assign(left: Vec<Expression>, right: Vec<Expression>) -> Self {
        Self::new(StatementKind::Assignment { left, right })
    }

    pub fn assign_one(left: Expression, right: Expression) -> Self {
        Self::assign(vec![left], vec![right])
    }

    pub fn expression(expression: Expression) -> Self {
        let range = expression.range;
        Self::new(StatementKind::Expression(expression)).with_range(range)
    }

    pub fn ret(expressions: Vec<Expression>) -> Self {
        Self::new(StatementKind::Return(expressions))
    }

    pub fn do_block(statements: Vec<Statement>) -> Self {
        Self::new(StatementKind::Do(Block::new(statements)))
    }

    pub fn if_then(condition: Expression, then_block: Block, else_branch: Option<ElseBranch>) -> Self {
        Self::new(StatementKind::If(IfStatement {
            condition,
            then_block,
            else_branch,
        }))
    }

    pub fn while_loop(condition: Expression, body: Block) -> Self {
        Self::new(StatementKind::While { condition, body })
    }

    pub fn repeat(body: Block, condition: Expression) -> Self {
        Self::new(StatementKind::Repeat { body, condition })
    }

    pub fn for_in(names: Vec<Identifier>, expressions: Vec<Expression>, body: Block) -> Self {
        Self::new(StatementKind::ForIn {
            names,
            expressions,
            body,
        })
    }

    pub fn goto(label: impl Into<String>) -> Self {
        Self::new(StatementKind::Goto(label.into()))
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self::new(StatementKind::Label(label.into()))
    }

    pub fn break_loop() -> Self {
        Self::new(StatementKind::Break)
    }
}
