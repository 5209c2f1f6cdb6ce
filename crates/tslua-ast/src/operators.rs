//! Lua operators and their rendering.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    Negate,
    Length,
    Not,
    BitwiseNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
}

/// Binding strength of unary operators.
pub const UNARY_PRECEDENCE: u8 = 11;

impl UnaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Length => "#",
            UnaryOperator::Not => "not ",
            UnaryOperator::BitwiseNot => "~",
        }
    }
}

impl BinaryOperator {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "^",
            BinaryOperator::Concat => "..",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "~=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "~",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
        }
    }

    /// Lua 5.4 reference manual §3.4.8, lowest first.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => 3,
            BinaryOperator::BitwiseOr => 4,
            BinaryOperator::BitwiseXor => 5,
            BinaryOperator::BitwiseAnd => 6,
            BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => 7,
            BinaryOperator::Concat => 8,
            BinaryOperator::Add | BinaryOperator::Sub => 9,
            BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::FloorDiv
            | BinaryOperator::Mod => 10,
            BinaryOperator::Pow => 12,
        }
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, BinaryOperator::Concat | BinaryOperator::Pow)
    }
}
