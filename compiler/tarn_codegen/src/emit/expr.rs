use tarn_ir::ir::{CallHint, ConstValue, IrKind, IrNode, Pattern, PatternKind};
use tarn_ir::{Intrinsic, Path, Span, Type};
use tarn_stack::ensure_sufficient_stack;

use super::Generator;
use crate::erase::structural;
use crate::error::index_of;
use crate::hints::chain_head;
use crate::instruction::Instruction;
use crate::{CodegenError, ReducedType};

impl Generator<'_> {
    /// Emit `node`, leaving its value on the stack.
    pub(super) fn emit_expr(&mut self, node: &IrNode) -> Result<(), CodegenError> {
        ensure_sufficient_stack(|| self.emit_expr_inner(node))
    }

    fn emit_expr_inner(&mut self, node: &IrNode) -> Result<(), CodegenError> {
        let span = node.span;
        let ty = &node.value.ty;
        match &node.value.value {
            IrKind::Const(value) => self.emit_const(span, ty, value),
            IrKind::Identifier(path) => self.emit_path(span, ty, *path),
            IrKind::Let {
                pattern,
                value,
                body,
            } => {
                self.emit_binding(pattern, value)?;
                self.emit_expr(body)
            }
            IrKind::Tuple(items) => {
                for item in items {
                    self.emit_expr(item)?;
                }
                self.push(Instruction::MakeProduct(index_of(items.len(), "tuple items")?));
                Ok(())
            }
            IrKind::Record { fields, .. } => {
                // Stored in declaration order, whatever the literal's order.
                let declared = self.record_fields(span, ty)?;
                for name in &declared {
                    let value = fields
                        .iter()
                        .find(|(field, _)| field.value == *name)
                        .map(|(_, value)| value)
                        .ok_or(CodegenError::UnknownField(span))?;
                    self.emit_expr(value)?;
                }
                self.push(Instruction::MakeProduct(index_of(declared.len(), "record fields")?));
                Ok(())
            }
            IrKind::Project { value, field } => {
                let declared = self.record_fields(value.span, &value.value.ty)?;
                let index = declared
                    .iter()
                    .position(|name| *name == field.value)
                    .ok_or(CodegenError::UnknownField(field.span))?;
                self.emit_expr(value)?;
                self.push(Instruction::ProductGet(index_of(index, "record fields")?));
                Ok(())
            }
            IrKind::Function(function) => self.emit_closure(node, function, None),
            IrKind::Call {
                callee,
                argument,
                hint,
            } => self.emit_call(node, callee, argument, *hint),
            IrKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let result = self.erase(ty)?;
                self.emit_expr(condition)?;
                self.push(Instruction::If(result));
                self.emit_expr(then_branch)?;
                self.push(Instruction::Else);
                self.emit_expr(else_branch)?;
                self.push(Instruction::End);
                Ok(())
            }
            IrKind::Match {
                scrutinee,
                patterns,
                branches,
            } => self.emit_match(ty, scrutinee, patterns, branches),
            IrKind::Error => Err(CodegenError::ErrorNode(span)),
        }
    }

    pub(super) fn emit_const(&mut self, span: Span, ty: &Type, value: &ConstValue) -> Result<(), CodegenError> {
        let instruction = match value {
            ConstValue::Unit => Instruction::MakeProduct(0),
            ConstValue::Int(v) => Instruction::I64Const(*v),
            ConstValue::Real(v) => Instruction::F64Const(*v),
            ConstValue::Bool(v) => Instruction::I8Const(i8::from(*v)),
            ConstValue::Char(c) => Instruction::I32Const(u32::from(*c) as i32),
            ConstValue::Text(text) => Instruction::TextConst(self.texts.intern(text)?),
            ConstValue::EmptyArray => match structural(self.universe, ty)? {
                Type::Array(element) => Instruction::ArrayNew(self.erase(&element)?),
                _ => return Err(CodegenError::NotAnArray(span)),
            },
        };
        self.push(instruction);
        Ok(())
    }

    /// Field names of a record type in declaration order.
    fn record_fields(&self, span: Span, ty: &Type) -> Result<Vec<tarn_ir::Name>, CodegenError> {
        match structural(self.universe, ty)? {
            Type::Record { fields, .. } => Ok(fields.into_iter().map(|(name, _)| name).collect()),
            _ => Err(CodegenError::NotARecord(span)),
        }
    }

    fn emit_call(
        &mut self,
        node: &IrNode,
        callee: &IrNode,
        argument: &IrNode,
        hint: CallHint,
    ) -> Result<(), CodegenError> {
        match hint {
            CallHint::Intrinsic(op) => self.emit_intrinsic(node, op),
            CallHint::Constructor { tag } => {
                self.emit_expr(argument)?;
                self.push(Instruction::MakeVariant {
                    tag,
                    has_payload: true,
                });
                Ok(())
            }
            CallHint::Direct(path) => match self.direct.get(&path).copied() {
                Some(index) => {
                    self.emit_expr(argument)?;
                    self.push(Instruction::Call(index));
                    Ok(())
                }
                None => self.emit_indirect(callee, argument),
            },
            CallHint::Indirect | CallHint::Partial | CallHint::Unresolved => {
                self.emit_indirect(callee, argument)
            }
        }
    }

    fn emit_indirect(&mut self, callee: &IrNode, argument: &IrNode) -> Result<(), CodegenError> {
        let signature = self.function_signature(callee.span, &callee.value.ty)?;
        self.emit_expr(callee)?;
        self.emit_expr(argument)?;
        self.push(Instruction::CallRef(signature));
        Ok(())
    }

    /// A saturated operator chain becomes its operands and one instruction.
    fn emit_intrinsic(&mut self, node: &IrNode, op: Intrinsic) -> Result<(), CodegenError> {
        let arguments = chain_arguments(node);
        let Some(first) = arguments.first() else {
            return Err(CodegenError::NotAFunction(node.span));
        };
        let operand = self.erase(&first.value.ty)?;
        match (op, arguments.as_slice()) {
            (Intrinsic::And, [lhs, rhs]) => {
                self.emit_expr(lhs)?;
                self.push(Instruction::If(ReducedType::I8));
                self.emit_expr(rhs)?;
                self.push(Instruction::Else);
                self.push(Instruction::I8Const(0));
                self.push(Instruction::End);
            }
            (Intrinsic::Or, [lhs, rhs]) => {
                self.emit_expr(lhs)?;
                self.push(Instruction::If(ReducedType::I8));
                self.push(Instruction::I8Const(1));
                self.push(Instruction::Else);
                self.emit_expr(rhs)?;
                self.push(Instruction::End);
            }
            _ => {
                for argument in &arguments {
                    self.emit_expr(argument)?;
                }
                self.push(Instruction::Intrinsic(op, operand));
            }
        }
        Ok(())
    }

    /// `let pattern = value`, in the current function or at module level.
    pub(super) fn emit_binding(&mut self, pattern: &Pattern, value: &IrNode) -> Result<(), CodegenError> {
        for (path, ty) in bindings(pattern) {
            self.declare(path, ty)?;
        }
        match (&value.value.value, simple_binding(pattern)) {
            (IrKind::Function(function), Some(path))
                if function.captures.iter().any(|capture| capture.value == path) =>
            {
                self.emit_closure(value, function, Some(path))?;
            }
            _ => self.emit_expr(value)?,
        }
        let value_ty = self.erase(&value.value.ty)?;
        let slot = self.builder.temp(value_ty)?;
        self.push(Instruction::LocalSet(slot));
        if self.refutable(pattern) {
            self.emit_test(pattern, slot)?;
            self.push(Instruction::If(ReducedType::unit()));
            self.push(Instruction::MakeProduct(0));
            self.push(Instruction::Else);
            self.push(Instruction::Unreachable);
            self.push(Instruction::End);
            self.push(Instruction::Drop);
        }
        self.emit_bind(pattern, slot)
    }

    fn emit_match(
        &mut self,
        ty: &Type,
        scrutinee: &IrNode,
        patterns: &[Pattern],
        branches: &[IrNode],
    ) -> Result<(), CodegenError> {
        let result = self.erase(ty)?;
        self.emit_expr(scrutinee)?;
        let scrutinee_ty = self.erase(&scrutinee.value.ty)?;
        let slot = self.builder.temp(scrutinee_ty)?;
        self.push(Instruction::LocalSet(slot));

        let mut open = 0;
        let mut exhausted = false;
        for (pattern, branch) in patterns.iter().zip(branches) {
            for (path, ty) in bindings(pattern) {
                self.declare(path, ty)?;
            }
            if self.refutable(pattern) {
                self.emit_test(pattern, slot)?;
                self.push(Instruction::If(result.clone()));
                self.emit_bind(pattern, slot)?;
                self.emit_expr(branch)?;
                self.push(Instruction::Else);
                open += 1;
            } else {
                // Later arms can never be reached.
                self.emit_bind(pattern, slot)?;
                self.emit_expr(branch)?;
                exhausted = true;
                break;
            }
        }
        if !exhausted {
            self.push(Instruction::Unreachable);
        }
        for _ in 0..open {
            self.push(Instruction::End);
        }
        Ok(())
    }
}

/// Arguments of the call chain rooted at `node`, in application order.
fn chain_arguments(node: &IrNode) -> Vec<&IrNode> {
    let (_, applied) = chain_head(node);
    let mut arguments = Vec::with_capacity(applied);
    let mut current = node;
    while let IrKind::Call {
        callee, argument, ..
    } = &current.value.value
    {
        arguments.push(argument.as_ref());
        current = callee;
    }
    arguments.reverse();
    arguments
}

/// The path of a pattern that binds one name and tests nothing.
fn simple_binding(pattern: &Pattern) -> Option<Path> {
    match &pattern.value.value {
        PatternKind::Binding(path) => Some(*path),
        PatternKind::Hinted { pattern, .. } => simple_binding(pattern),
        _ => None,
    }
}

/// Every name `pattern` binds, with its type.
pub(super) fn bindings(pattern: &Pattern) -> Vec<(Path, &Type)> {
    let mut out = Vec::new();
    collect_bindings(pattern, &mut out);
    out
}

fn collect_bindings<'p>(pattern: &'p Pattern, out: &mut Vec<(Path, &'p Type)>) {
    match &pattern.value.value {
        PatternKind::Wildcard | PatternKind::Const(_) | PatternKind::Error => {}
        PatternKind::Binding(path) => out.push((*path, &pattern.value.ty)),
        PatternKind::Tuple(items) => {
            for item in items {
                collect_bindings(item, out);
            }
        }
        PatternKind::Array(array) => {
            let (leading, rest, trailing) = array.parts();
            for item in leading {
                collect_bindings(item, out);
            }
            if let Some(Some(path)) = rest {
                out.push((path, &pattern.value.ty));
            }
            for item in trailing {
                collect_bindings(item, out);
            }
        }
        PatternKind::Constructor { payload, .. } => {
            if let Some(payload) = payload {
                collect_bindings(payload, out);
            }
        }
        PatternKind::Hinted { pattern, .. } => collect_bindings(pattern, out),
    }
}
