//! Pattern tests and binding code.
//!
//! A test leaves an `i8` on the stack. Each check opens an `if`, so the
//! extraction code for the next check runs only once everything before it
//! has matched:
//!
//! ```text
//! check1 if i8 extract check2 if i8 ... i8.const 1 else i8.const 0 end ... else i8.const 0 end
//! ```

use tarn_ir::ir::{ArrayPattern, ConstValue, Pattern, PatternKind};
use tarn_ir::{Intrinsic, Type};
use tarn_stack::ensure_sufficient_stack;

use super::Generator;
use crate::erase::structural;
use crate::error::index_of;
use crate::instruction::Instruction;
use crate::{CodegenError, ReducedType};

/// Where an array element sits.
#[derive(Copy, Clone)]
enum Index {
    FromStart(u32),
    /// Counted from one past the last element: `FromEnd(1)` is the last.
    FromEnd(u32),
}

impl Generator<'_> {
    pub(super) fn refutable(&self, pattern: &Pattern) -> bool {
        match &pattern.value.value {
            PatternKind::Wildcard | PatternKind::Binding(_) | PatternKind::Const(ConstValue::Unit) => {
                false
            }
            PatternKind::Const(_) | PatternKind::Array(_) | PatternKind::Error => true,
            PatternKind::Tuple(items) => items.iter().any(|item| self.refutable(item)),
            PatternKind::Hinted { pattern, .. } => self.refutable(pattern),
            // A sum with one variant still needs its payload checked.
            PatternKind::Constructor { path, payload } => {
                let single = self
                    .universe
                    .constructor(*path)
                    .and_then(|info| self.universe.get(info.owner))
                    .is_some_and(|definition| {
                        matches!(&definition.base, Type::Sum { variants, .. } if variants.len() == 1)
                    });
                !single || payload.as_ref().is_some_and(|payload| self.refutable(payload))
            }
        }
    }

    /// Test the value in local `slot` against `pattern`, pushing `1` on a
    /// match.
    pub(super) fn emit_test(&mut self, pattern: &Pattern, slot: u32) -> Result<(), CodegenError> {
        let mut open = 0;
        self.emit_checks(pattern, slot, &mut open)?;
        self.push(Instruction::I8Const(1));
        for _ in 0..open {
            self.push(Instruction::Else);
            self.push(Instruction::I8Const(0));
            self.push(Instruction::End);
        }
        Ok(())
    }

    fn open_check(&mut self, open: &mut u32) {
        self.push(Instruction::If(ReducedType::I8));
        *open += 1;
    }

    fn emit_checks(&mut self, pattern: &Pattern, slot: u32, open: &mut u32) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| self.emit_checks_inner(pattern, slot, open))
    }

    fn emit_checks_inner(&mut self, pattern: &Pattern, slot: u32, open: &mut u32) -> Result<(), CodegenError> {
        match &pattern.value.value {
            PatternKind::Wildcard | PatternKind::Binding(_) | PatternKind::Const(ConstValue::Unit) => {
                Ok(())
            }
            PatternKind::Error => Err(CodegenError::ErrorNode(pattern.span)),
            PatternKind::Hinted { pattern, .. } => self.emit_checks(pattern, slot, open),
            PatternKind::Const(value) => {
                let operand = self.erase(&pattern.value.ty)?;
                self.push(Instruction::LocalGet(slot));
                self.emit_const(pattern.span, &pattern.value.ty, value)?;
                self.push(Instruction::Intrinsic(Intrinsic::Eq, operand));
                self.open_check(open);
                Ok(())
            }
            PatternKind::Tuple(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !self.refutable(item) {
                        continue;
                    }
                    let part = self.extract_field(slot, index_of(index, "tuple items")?, &item.value.ty)?;
                    self.emit_checks(item, part, open)?;
                }
                Ok(())
            }
            PatternKind::Constructor { path, payload } => {
                let tag = self
                    .universe
                    .constructor(*path)
                    .map(|info| info.tag)
                    .ok_or(CodegenError::UnboundName(*path))?;
                self.push(Instruction::LocalGet(slot));
                self.push(Instruction::TagTest(tag));
                self.open_check(open);
                if let Some(payload) = payload {
                    if self.refutable(payload) {
                        let part = self.extract_payload(slot, &payload.value.ty)?;
                        self.emit_checks(payload, part, open)?;
                    }
                }
                Ok(())
            }
            PatternKind::Array(array) => self.emit_array_checks(pattern, array, slot, open),
        }
    }

    fn emit_array_checks(
        &mut self,
        pattern: &Pattern,
        array: &ArrayPattern,
        slot: u32,
        open: &mut u32,
    ) -> Result<(), CodegenError> {
        let (leading, rest, trailing) = array.parts();
        let fixed = (leading.len() + trailing.len()) as i64;
        self.push(Instruction::LocalGet(slot));
        self.push(Instruction::ArrayLen);
        self.push(Instruction::I64Const(fixed));
        let compare = if rest.is_some() {
            Intrinsic::GtEq
        } else {
            Intrinsic::Eq
        };
        self.push(Instruction::Intrinsic(compare, ReducedType::I64));
        self.open_check(open);

        let element = self.array_element(pattern)?;
        for (index, item) in positioned(leading, trailing)? {
            if !self.refutable(item) {
                continue;
            }
            let part = self.extract_element(slot, index, &element)?;
            self.emit_checks(item, part, open)?;
        }
        Ok(())
    }

    /// Store the names `pattern` binds from the value in local `slot`.
    /// The value is known to match.
    pub(super) fn emit_bind(&mut self, pattern: &Pattern, slot: u32) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| self.emit_bind_inner(pattern, slot))
    }

    fn emit_bind_inner(&mut self, pattern: &Pattern, slot: u32) -> Result<(), CodegenError> {
        match &pattern.value.value {
            PatternKind::Wildcard | PatternKind::Const(_) => Ok(()),
            PatternKind::Error => Err(CodegenError::ErrorNode(pattern.span)),
            PatternKind::Binding(path) => {
                self.push(Instruction::LocalGet(slot));
                self.store(*path)
            }
            PatternKind::Hinted { pattern, .. } => self.emit_bind(pattern, slot),
            PatternKind::Tuple(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !binds(item) {
                        continue;
                    }
                    let part = self.extract_field(slot, index_of(index, "tuple items")?, &item.value.ty)?;
                    self.emit_bind(item, part)?;
                }
                Ok(())
            }
            PatternKind::Constructor { payload, .. } => match payload {
                Some(payload) if binds(payload) => {
                    let part = self.extract_payload(slot, &payload.value.ty)?;
                    self.emit_bind(payload, part)
                }
                _ => Ok(()),
            },
            PatternKind::Array(array) => {
                let (leading, rest, trailing) = array.parts();
                let element = self.array_element(pattern)?;
                for (index, item) in positioned(leading, trailing)? {
                    if !binds(item) {
                        continue;
                    }
                    let part = self.extract_element(slot, index, &element)?;
                    self.emit_bind(item, part)?;
                }
                if let Some(Some(path)) = rest {
                    self.push(Instruction::LocalGet(slot));
                    self.push(Instruction::ArraySlice {
                        from_start: index_of(leading.len(), "array elements")?,
                        from_end: index_of(trailing.len(), "array elements")?,
                    });
                    self.store(path)?;
                }
                Ok(())
            }
        }
    }

    fn array_element(&self, pattern: &Pattern) -> Result<ReducedType, CodegenError> {
        match structural(self.universe, &pattern.value.ty)? {
            Type::Array(element) => self.erase(&element),
            _ => Err(CodegenError::NotAnArray(pattern.span)),
        }
    }

    fn extract_field(&mut self, slot: u32, index: u32, ty: &Type) -> Result<u32, CodegenError> {
        let part_ty = self.erase(ty)?;
        let part = self.builder.temp(part_ty)?;
        self.push(Instruction::LocalGet(slot));
        self.push(Instruction::ProductGet(index));
        self.push(Instruction::LocalSet(part));
        Ok(part)
    }

    fn extract_payload(&mut self, slot: u32, ty: &Type) -> Result<u32, CodegenError> {
        let part_ty = self.erase(ty)?;
        let part = self.builder.temp(part_ty.clone())?;
        self.push(Instruction::LocalGet(slot));
        self.push(Instruction::VariantPayload(part_ty));
        self.push(Instruction::LocalSet(part));
        Ok(part)
    }

    fn extract_element(&mut self, slot: u32, index: Index, element: &ReducedType) -> Result<u32, CodegenError> {
        let part = self.builder.temp(element.clone())?;
        self.push(Instruction::LocalGet(slot));
        match index {
            Index::FromStart(i) => self.push(Instruction::I64Const(i64::from(i))),
            Index::FromEnd(k) => {
                self.push(Instruction::LocalGet(slot));
                self.push(Instruction::ArrayLen);
                self.push(Instruction::I64Const(i64::from(k)));
                self.push(Instruction::Intrinsic(Intrinsic::SubInt, ReducedType::I64));
            }
        }
        self.push(Instruction::ArrayGet(element.clone()));
        self.push(Instruction::LocalSet(part));
        Ok(part)
    }
}

fn positioned<'p>(leading: &'p [Pattern], trailing: &'p [Pattern]) -> Result<Vec<(Index, &'p Pattern)>, CodegenError> {
    let count = trailing.len();
    let from_start = leading
        .iter()
        .enumerate()
        .map(|(i, item)| Ok((Index::FromStart(index_of(i, "array elements")?), item)));
    let from_end = trailing
        .iter()
        .enumerate()
        .map(|(i, item)| Ok((Index::FromEnd(index_of(count - i, "array elements")?), item)));
    from_start.chain(from_end).collect()
}

fn binds(pattern: &Pattern) -> bool {
    !super::expr::bindings(pattern).is_empty()
}
