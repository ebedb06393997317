//! Types of the prelude operator functions.

use tarn_ir::{Intrinsic, Type};

use crate::unify::InferenceContext;

fn binary(operand: Type, result: Type) -> Type {
    Type::function(operand.clone(), Type::function(operand, result))
}

/// A fresh instance of the operator's type. Comparisons and the array
/// operations are polymorphic; everything else is fixed.
pub fn intrinsic_type(op: Intrinsic, ctx: &mut InferenceContext<'_>) -> Type {
    match op {
        Intrinsic::AddInt
        | Intrinsic::SubInt
        | Intrinsic::MulInt
        | Intrinsic::DivInt
        | Intrinsic::RemInt => binary(Type::Int, Type::Int),
        Intrinsic::AddReal | Intrinsic::SubReal | Intrinsic::MulReal | Intrinsic::DivReal => {
            binary(Type::Real, Type::Real)
        }
        Intrinsic::Concat => binary(Type::Text, Type::Text),
        Intrinsic::Eq
        | Intrinsic::NotEq
        | Intrinsic::Lt
        | Intrinsic::LtEq
        | Intrinsic::Gt
        | Intrinsic::GtEq => binary(ctx.fresh_var(), Type::Bool),
        Intrinsic::And | Intrinsic::Or => binary(Type::Bool, Type::Bool),
        Intrinsic::Neg => Type::function(Type::Int, Type::Int),
        Intrinsic::Not => Type::function(Type::Bool, Type::Bool),
        Intrinsic::Push => {
            let element = ctx.fresh_var();
            Type::function(
                Type::array(element.clone()),
                Type::function(element.clone(), Type::array(element)),
            )
        }
        Intrinsic::Append => {
            let array = Type::array(ctx.fresh_var());
            binary(array.clone(), array)
        }
    }
}
