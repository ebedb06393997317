//! Functions synthesized for constructors and operators used as values.

use tarn_ir::{Intrinsic, Path, Span, Type};

use super::{FunctionBuilder, Generator};
use crate::instruction::Instruction;
use crate::{CodegenError, ReducedType};

impl Generator<'_> {
    /// `fn payload => Variant payload`, once per constructor.
    pub(super) fn constructor_wrapper(&mut self, path: Path) -> Result<u32, CodegenError> {
        if let Some(&index) = self.constructor_wrappers.get(&path) {
            return Ok(index);
        }
        let info = self
            .universe
            .constructor(path)
            .ok_or(CodegenError::UnboundName(path))?;
        let tag = info.tag;
        let payload = match &info.payload {
            Some(payload) => self.erase(payload)?,
            None => ReducedType::unit(),
        };
        let index = self.reserve()?;
        self.constructor_wrappers.insert(path, index);

        let name = format!("{}$ctor", self.path_name(path));
        let signature = self.signatures.intern(payload.clone(), ReducedType::TaggedVariant)?;
        let mut builder = FunctionBuilder::new(name, payload, false);
        builder.body.push(Instruction::LocalGet(0));
        builder.body.push(Instruction::MakeVariant {
            tag,
            has_payload: true,
        });
        self.install(index, signature, builder);
        Ok(index)
    }

    /// A curried function performing `op`, at the operand type given by
    /// `ty`, the type of the operator at its use.
    pub(super) fn operator_wrapper(&mut self, span: Span, op: Intrinsic, ty: &Type) -> Result<u32, CodegenError> {
        let (domain, codomain) = self.function_parts(span, ty)?;
        let operand = self.erase(&domain)?;
        let key = (op, operand.clone());
        if let Some(&index) = self.operator_wrappers.get(&key) {
            return Ok(index);
        }
        let index = self.reserve()?;
        self.operator_wrappers.insert(key, index);
        let name = format!("{}$op", op.name());

        if op.arity() == 1 {
            let result = self.erase(&codomain)?;
            let signature = self.signatures.intern(operand.clone(), result)?;
            let mut builder = FunctionBuilder::new(name, operand.clone(), false);
            builder.body.push(Instruction::LocalGet(0));
            builder.body.push(Instruction::Intrinsic(op, operand));
            self.install(index, signature, builder);
            return Ok(index);
        }

        // The outer function captures the first operand in a closure over
        // the inner one.
        let (second, result) = self.function_parts(span, &codomain)?;
        let second = self.erase(&second)?;
        let result = self.erase(&result)?;
        let inner = self.reserve()?;
        let inner_signature = self.signatures.intern(second.clone(), result)?;
        let mut inner_builder = FunctionBuilder::new(format!("{name}1"), second, false);
        inner_builder.temp(operand.clone())?;
        inner_builder.body.extend([
            Instruction::LocalGet(1),
            Instruction::LocalGet(0),
            Instruction::Intrinsic(op, operand.clone()),
        ]);
        self.install(inner, inner_signature, inner_builder);

        let signature = self
            .signatures
            .intern(operand.clone(), ReducedType::FunctionRef)?;
        let mut builder = FunctionBuilder::new(name, operand, false);
        builder.body.extend([
            Instruction::LocalGet(0),
            Instruction::MakeClosure {
                function: inner,
                captures: 1,
            },
        ]);
        self.install(index, signature, builder);
        Ok(index)
    }
}

