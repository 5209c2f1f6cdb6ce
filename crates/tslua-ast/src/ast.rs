//! Lua statement and expression nodes.

use bitflags::bitflags;
use serde::Serialize;

use crate::operators::{BinaryOperator, UnaryOperator};

/// Position of the TypeScript node a Lua node was produced from.
///
/// `line` and `column` are 0-based and refer to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

bitflags! {
    /// Flags patched onto expressions right after construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Function body may be printed on one line.
        const INLINE = 1;
        /// Function came from a declaration and may print as `function name()`.
        const DECLARATION = 1 << 1;
        /// Call to an unpack function that may expand to several values.
        const TABLE_UNPACK_CALL = 1 << 2;
        /// Value is only produced for expression position and may be dropped.
        const POSSIBLY_NOT_USED = 1 << 3;
    }
}

/// A list of statements with its own Lua scope.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl From<Vec<Statement>> for Block {
    fn from(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub kind: StatementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementKind {
    Do(Block),
    VariableDeclaration {
        left: Vec<Identifier>,
        right: Vec<Expression>,
    },
    Assignment {
        left: Vec<Expression>,
        right: Vec<Expression>,
    },
    If(IfStatement),
    While {
        condition: Expression,
        body: Block,
    },
    Repeat {
        body: Block,
        condition: Expression,
    },
    NumericFor {
        control: Identifier,
        start: Expression,
        limit: Expression,
        step: Option<Expression>,
        body: Block,
    },
    ForIn {
        names: Vec<Identifier>,
        expressions: Vec<Expression>,
        body: Block,
    },
    Goto(String),
    Label(String),
    Return(Vec<Expression>),
    Break,
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElseBranch {
    Block(Block),
    ElseIf(Box<IfStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    #[serde(skip)]
    pub flags: NodeFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpressionKind {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Dots,
    Function(FunctionExpression),
    Table(Vec<TableField>),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Parenthesized(Box<Expression>),
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    MethodCall {
        receiver: Box<Expression>,
        name: String,
        arguments: Vec<Expression>,
    },
    Identifier(Identifier),
    TableIndex {
        table: Box<Expression>,
        index: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionExpression {
    pub params: Vec<Identifier>,
    pub dots: bool,
    pub body: Block,
}

/// Table constructor field. Positional when `key` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableField {
    pub key: Option<Expression>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub text: String,
    /// Symbol of the TypeScript binding, used for hoisting and export lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_id: Option<u32>,
    /// Name as written in the source when `text` had to be renamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

impl Identifier {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            symbol_id: None,
            original_name: None,
            range: None,
        }
    }

    pub fn with_symbol(mut self, symbol_id: Option<u32>) -> Self {
        self.symbol_id = symbol_id;
        self
    }

    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { kind, range: None }
    }

    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StatementKind::Return(_))
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            kind,
            range: None,
            flags: NodeFlags::empty(),
        }
    }

    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Literal values that can be duplicated or reordered freely.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Nil
                | ExpressionKind::Boolean(_)
                | ExpressionKind::Number(_)
                | ExpressionKind::String(_)
        )
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExpressionKind::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ExpressionKind::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::String(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this is a call that may produce several values in a list position.
    pub fn is_multi_value(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Call { .. } | ExpressionKind::MethodCall { .. } | ExpressionKind::Dots
        )
    }
}

impl From<Identifier> for Expression {
    fn from(identifier: Identifier) -> Self {
        let range = identifier.range;
        Expression::new(ExpressionKind::Identifier(identifier)).with_range(range)
    }
}
