//! The stack-machine instruction set and the program container.

use std::fmt;

use rustc_hash::FxHashMap;
use tarn_ir::Intrinsic;

use crate::error::index_of;
use crate::{CodegenError, ReducedType};

/// Index into [`Program::signatures`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SignatureId(pub u32);

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Signature {
    pub param: ReducedType,
    pub result: ReducedType,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Instruction {
    I64Const(i64),
    F64Const(f64),
    I32Const(i32),
    I8Const(i8),
    /// Push text literal `n` of [`Program::texts`].
    TextConst(u32),
    LocalGet(u32),
    LocalSet(u32),
    GlobalGet(u32),
    GlobalSet(u32),
    /// Push a closure over function `n` with no captured values.
    FunctionRef(u32),
    /// Pop `captures` values and push a closure over `function` holding them.
    MakeClosure { function: u32, captures: u32 },
    /// Pop the argument and call function `n` directly.
    Call(u32),
    /// Pop the argument, then the closure, and call it.
    CallRef(SignatureId),
    /// Pop the operands and apply the operation at the given operand type.
    Intrinsic(Intrinsic, ReducedType),
    MakeProduct(u32),
    ProductGet(u32),
    ArrayNew(ReducedType),
    ArrayLen,
    /// Pop an index, then an array.
    ArrayGet(ReducedType),
    /// Pop an array and push the elements between `from_start` and
    /// `len - from_end`.
    ArraySlice { from_start: u32, from_end: u32 },
    MakeVariant { tag: u32, has_payload: bool },
    /// Pop a variant, push `1` if its tag is `n`.
    TagTest(u32),
    VariantPayload(ReducedType),
    /// Pop a condition; the block leaves a value of the given type.
    If(ReducedType),
    Else,
    End,
    Drop,
    Unreachable,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::I64Const(v) => write!(f, "i64.const {v}"),
            Instruction::F64Const(v) => write!(f, "f64.const {v}"),
            Instruction::I32Const(v) => write!(f, "i32.const {v}"),
            Instruction::I8Const(v) => write!(f, "i8.const {v}"),
            Instruction::TextConst(n) => write!(f, "text.const {n}"),
            Instruction::LocalGet(n) => write!(f, "local.get {n}"),
            Instruction::LocalSet(n) => write!(f, "local.set {n}"),
            Instruction::GlobalGet(n) => write!(f, "global.get {n}"),
            Instruction::GlobalSet(n) => write!(f, "global.set {n}"),
            Instruction::FunctionRef(n) => write!(f, "ref.func {n}"),
            Instruction::MakeClosure { function, captures } => {
                write!(f, "closure.new {function} {captures}")
            }
            Instruction::Call(n) => write!(f, "call {n}"),
            Instruction::CallRef(sig) => write!(f, "call_ref {}", sig.0),
            Instruction::Intrinsic(op, ty) => write!(f, "{} {ty}", op.name()),
            Instruction::MakeProduct(n) => write!(f, "product.new {n}"),
            Instruction::ProductGet(n) => write!(f, "product.get {n}"),
            Instruction::ArrayNew(ty) => write!(f, "array.new {ty}"),
            Instruction::ArrayLen => f.write_str("array.len"),
            Instruction::ArrayGet(ty) => write!(f, "array.get {ty}"),
            Instruction::ArraySlice {
                from_start,
                from_end,
            } => write!(f, "array.slice {from_start} {from_end}"),
            Instruction::MakeVariant { tag, has_payload } => {
                write!(f, "variant.new {tag}{}", if *has_payload { " payload" } else { "" })
            }
            Instruction::TagTest(tag) => write!(f, "variant.test {tag}"),
            Instruction::VariantPayload(ty) => write!(f, "variant.payload {ty}"),
            Instruction::If(ty) => write!(f, "if {ty}"),
            Instruction::Else => f.write_str("else"),
            Instruction::End => f.write_str("end"),
            Instruction::Drop => f.write_str("drop"),
            Instruction::Unreachable => f.write_str("unreachable"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct EncodedFunction {
    /// Source name, or a synthesized one such as `add$op`.
    pub name: String,
    pub signature: SignatureId,
    /// Slot 0 is the parameter, then one slot per capture, then temporaries.
    pub locals: Vec<ReducedType>,
    pub body: Vec<Instruction>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Global {
    pub name: String,
    pub ty: ReducedType,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Program {
    pub signatures: Vec<Signature>,
    pub functions: Vec<EncodedFunction>,
    pub globals: Vec<Global>,
    pub texts: Vec<String>,
    /// Index of the parameterless function that runs the module's
    /// top-level code.
    pub entry: u32,
}

impl Program {
    pub fn signature(&self, id: SignatureId) -> Option<&Signature> {
        self.signatures.get(id.0 as usize)
    }

    pub fn function(&self, index: u32) -> Option<&EncodedFunction> {
        self.functions.get(index as usize)
    }

    pub fn function_named(&self, name: &str) -> Option<&EncodedFunction> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn entry_function(&self) -> Option<&EncodedFunction> {
        self.function(self.entry)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, global) in self.globals.iter().enumerate() {
            writeln!(f, "global {index} {}: {}", global.name, global.ty)?;
        }
        for (index, function) in self.functions.iter().enumerate() {
            let marker = if u32::try_from(index).is_ok_and(|index| index == self.entry) { " entry" } else { "" };
            match self.signature(function.signature) {
                Some(sig) => writeln!(
                    f,
                    "fn {index} {}{marker}: {} -> {}",
                    function.name, sig.param, sig.result
                )?,
                None => writeln!(f, "fn {index} {}{marker}", function.name)?,
            }
            let mut depth = 1usize;
            for instruction in &function.body {
                if matches!(instruction, Instruction::Else | Instruction::End) {
                    depth = depth.saturating_sub(1);
                }
                writeln!(f, "{:width$}{instruction}", "", width = depth * 2)?;
                if matches!(instruction, Instruction::If(_) | Instruction::Else) {
                    depth += 1;
                }
            }
        }
        Ok(())
    }
}

/// Signatures deduplicated by value.
#[derive(Default, Debug)]
pub(crate) struct SignatureTable {
    signatures: Vec<Signature>,
    index: FxHashMap<Signature, SignatureId>,
}

impl SignatureTable {
    pub(crate) fn intern(&mut self, param: ReducedType, result: ReducedType) -> Result<SignatureId, CodegenError> {
        let signature = Signature { param, result };
        if let Some(&id) = self.index.get(&signature) {
            return Ok(id);
        }
        let id = SignatureId(index_of(self.signatures.len(), "signatures")?);
        self.signatures.push(signature.clone());
        self.index.insert(signature, id);
        Ok(id)
    }

    pub(crate) fn into_vec(self) -> Vec<Signature> {
        self.signatures
    }
}

/// Text literals deduplicated by value.
#[derive(Default, Debug)]
pub(crate) struct TextTable {
    texts: Vec<String>,
    index: FxHashMap<String, u32>,
}

impl TextTable {
    pub(crate) fn intern(&mut self, text: &str) -> Result<u32, CodegenError> {
        if let Some(&index) = self.index.get(text) {
            return Ok(index);
        }
        let index = index_of(self.texts.len(), "text literals")?;
        self.texts.push(text.to_owned());
        self.index.insert(text.to_owned(), index);
        Ok(index)
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signatures_are_interned_by_value() {
        let mut table = SignatureTable::default();
        let a = table.intern(ReducedType::I64, ReducedType::I64);
        let b = table.intern(ReducedType::I64, ReducedType::I8);
        let c = table.intern(ReducedType::I64, ReducedType::I64);
        assert_eq!(a, Ok(SignatureId(0)));
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(table.into_vec().len(), 2);
    }

    #[test]
    fn texts_are_interned_by_value() {
        let mut table = TextTable::default();
        assert_eq!(table.intern("hi"), Ok(0));
        assert_eq!(table.intern("there"), Ok(1));
        assert_eq!(table.intern("hi"), Ok(0));
        assert_eq!(table.into_vec(), vec!["hi".to_owned(), "there".to_owned()]);
    }

    #[test]
    fn display_indents_blocks() {
        let program = Program {
            signatures: vec![Signature {
                param: ReducedType::unit(),
                result: ReducedType::unit(),
            }],
            functions: vec![EncodedFunction {
                name: "main".to_owned(),
                signature: SignatureId(0),
                locals: vec![ReducedType::unit()],
                body: vec![
                    Instruction::I8Const(1),
                    Instruction::If(ReducedType::I64),
                    Instruction::I64Const(1),
                    Instruction::Else,
                    Instruction::I64Const(2),
                    Instruction::End,
                    Instruction::Drop,
                    Instruction::MakeProduct(0),
                ],
            }],
            globals: Vec::new(),
            texts: Vec::new(),
            entry: 0,
        };
        let expected = "\
fn 0 main entry: () -> ()
  i8.const 1
  if i64
    i64.const 1
  else
    i64.const 2
  end
  drop
  product.new 0
";
        assert_eq!(program.to_string(), expected);
    }
}
