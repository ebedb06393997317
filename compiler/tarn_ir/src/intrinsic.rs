//! Prelude operations.
//!
//! Operators desugar into calls to these functions. When code generation
//! sees one fully applied, it emits a single instruction instead of a call.

use crate::ast::{BinaryOp, UnaryOp};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Intrinsic {
    AddInt,
    SubInt,
    MulInt,
    DivInt,
    RemInt,
    AddReal,
    SubReal,
    MulReal,
    DivReal,
    Concat,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Neg,
    Not,
    Push,
    Append,
}

impl Intrinsic {
    pub const COUNT: usize = 22;

    pub const ALL: [Intrinsic; Self::COUNT] = [
        Intrinsic::AddInt,
        Intrinsic::SubInt,
        Intrinsic::MulInt,
        Intrinsic::DivInt,
        Intrinsic::RemInt,
        Intrinsic::AddReal,
        Intrinsic::SubReal,
        Intrinsic::MulReal,
        Intrinsic::DivReal,
        Intrinsic::Concat,
        Intrinsic::Eq,
        Intrinsic::NotEq,
        Intrinsic::Lt,
        Intrinsic::LtEq,
        Intrinsic::Gt,
        Intrinsic::GtEq,
        Intrinsic::And,
        Intrinsic::Or,
        Intrinsic::Neg,
        Intrinsic::Not,
        Intrinsic::Push,
        Intrinsic::Append,
    ];

    /// Name of the prelude function.
    pub const fn name(self) -> &'static str {
        match self {
            Intrinsic::AddInt => "add",
            Intrinsic::SubInt => "sub",
            Intrinsic::MulInt => "mul",
            Intrinsic::DivInt => "div",
            Intrinsic::RemInt => "rem",
            Intrinsic::AddReal => "add_real",
            Intrinsic::SubReal => "sub_real",
            Intrinsic::MulReal => "mul_real",
            Intrinsic::DivReal => "div_real",
            Intrinsic::Concat => "concat",
            Intrinsic::Eq => "eq",
            Intrinsic::NotEq => "ne",
            Intrinsic::Lt => "lt",
            Intrinsic::LtEq => "le",
            Intrinsic::Gt => "gt",
            Intrinsic::GtEq => "ge",
            Intrinsic::And => "and",
            Intrinsic::Or => "or",
            Intrinsic::Neg => "neg",
            Intrinsic::Not => "not",
            Intrinsic::Push => "push",
            Intrinsic::Append => "append",
        }
    }

    /// Number of curried arguments.
    pub const fn arity(self) -> usize {
        match self {
            Intrinsic::Neg | Intrinsic::Not => 1,
            _ => 2,
        }
    }

    pub const fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Intrinsic::AddInt,
            BinaryOp::Sub => Intrinsic::SubInt,
            BinaryOp::Mul => Intrinsic::MulInt,
            BinaryOp::Div => Intrinsic::DivInt,
            BinaryOp::Rem => Intrinsic::RemInt,
            BinaryOp::AddReal => Intrinsic::AddReal,
            BinaryOp::SubReal => Intrinsic::SubReal,
            BinaryOp::MulReal => Intrinsic::MulReal,
            BinaryOp::DivReal => Intrinsic::DivReal,
            BinaryOp::Concat => Intrinsic::Concat,
            BinaryOp::Eq => Intrinsic::Eq,
            BinaryOp::NotEq => Intrinsic::NotEq,
            BinaryOp::Lt => Intrinsic::Lt,
            BinaryOp::LtEq => Intrinsic::LtEq,
            BinaryOp::Gt => Intrinsic::Gt,
            BinaryOp::GtEq => Intrinsic::GtEq,
            BinaryOp::And => Intrinsic::And,
            BinaryOp::Or => Intrinsic::Or,
        }
    }

    pub const fn from_unary(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Neg => Intrinsic::Neg,
            UnaryOp::Not => Intrinsic::Not,
        }
    }

    /// Comparisons work on any operand type; code generation needs the
    /// operand representation to pick an instruction.
    pub const fn is_polymorphic(self) -> bool {
        matches!(
            self,
            Intrinsic::Eq
                | Intrinsic::NotEq
                | Intrinsic::Lt
                | Intrinsic::LtEq
                | Intrinsic::Gt
                | Intrinsic::GtEq
                | Intrinsic::Push
                | Intrinsic::Append
        )
    }

    /// `&&` and `||` evaluate their second operand lazily.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Intrinsic::And | Intrinsic::Or)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Intrinsic::ALL.iter().map(|i| i.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Intrinsic::ALL.len());
    }

    #[test]
    fn unary_intrinsics_take_one_argument() {
        assert_eq!(Intrinsic::from_unary(UnaryOp::Neg).arity(), 1);
        assert_eq!(Intrinsic::from_binary(BinaryOp::Concat).arity(), 2);
    }
}
