//! Instruction emission.
//!
//! Every function-valued IR subtree is lifted into its own
//! [`EncodedFunction`]; the enclosing function loads the captured values
//! and builds a closure. Top-level function bindings are called directly.
//! Bindings made at module level (including those inside top-level
//! `let ... in` and `match`) live in globals, so lifted functions reach
//! them without capturing.

mod expr;
mod pattern;
mod wrappers;

use std::mem;

use rustc_hash::FxHashMap;
use tarn_ir::ir::{IrFunction, IrItem, IrModule, IrNode};
use tarn_ir::{Intrinsic, Path, Span, StringInterner, Type};

use crate::erase::{erase, structural};
use crate::error::index_of;
use crate::hints::function_binding;
use crate::instruction::{
    EncodedFunction, Global, Instruction, Program, SignatureId, SignatureTable, TextTable,
};
use crate::{CodegenError, ReducedType};
use tarn_types::Universe;

/// A local closure that refers to itself. Inside its own body the closure
/// is rebuilt from the captured values instead of being captured.
#[derive(Clone, Debug)]
struct SelfClosure {
    function: u32,
    slots: Vec<u32>,
}

#[derive(Copy, Clone, Debug)]
enum Storage {
    Local(u32),
    Global(u32),
}

/// The function currently being emitted.
struct FunctionBuilder {
    name: String,
    /// Set for the entry function: bindings become globals.
    module_level: bool,
    locals: Vec<ReducedType>,
    body: Vec<Instruction>,
    bindings: FxHashMap<Path, u32>,
    recursive: FxHashMap<Path, SelfClosure>,
}

impl FunctionBuilder {
    fn new(name: String, param: ReducedType, module_level: bool) -> Self {
        FunctionBuilder {
            name,
            module_level,
            locals: vec![param],
            body: Vec::new(),
            bindings: FxHashMap::default(),
            recursive: FxHashMap::default(),
        }
    }

    fn temp(&mut self, ty: ReducedType) -> Result<u32, CodegenError> {
        let slot = index_of(self.locals.len(), "locals")?;
        self.locals.push(ty);
        Ok(slot)
    }
}

pub(crate) struct Generator<'u> {
    universe: &'u Universe,
    interner: Option<&'u StringInterner>,
    functions: Vec<Option<EncodedFunction>>,
    signatures: SignatureTable,
    texts: TextTable,
    globals: Vec<Global>,
    global_slots: FxHashMap<Path, u32>,
    /// Top-level function bindings, reserved before any emission.
    direct: FxHashMap<Path, u32>,
    constructor_wrappers: FxHashMap<Path, u32>,
    operator_wrappers: FxHashMap<(Intrinsic, ReducedType), u32>,
    builder: FunctionBuilder,
}

impl<'u> Generator<'u> {
    pub(crate) fn new(universe: &'u Universe, interner: Option<&'u StringInterner>) -> Self {
        Generator {
            universe,
            interner,
            functions: Vec::new(),
            signatures: SignatureTable::default(),
            texts: TextTable::default(),
            globals: Vec::new(),
            global_slots: FxHashMap::default(),
            direct: FxHashMap::default(),
            constructor_wrappers: FxHashMap::default(),
            operator_wrappers: FxHashMap::default(),
            builder: FunctionBuilder::new(String::new(), ReducedType::unit(), true),
        }
    }

    pub(crate) fn generate(mut self, module: &IrModule) -> Result<Program, CodegenError> {
        for item in &module.items {
            if let Some((path, _)) = function_binding(item) {
                let index = self.reserve()?;
                self.direct.insert(path, index);
            }
        }

        let entry = self.reserve()?;
        self.builder = FunctionBuilder::new("$entry".to_owned(), ReducedType::unit(), true);
        for item in &module.items {
            self.emit_item(item)?;
        }
        self.push(Instruction::MakeProduct(0));
        let signature = self.signatures.intern(ReducedType::unit(), ReducedType::unit())?;
        let builder = mem::replace(
            &mut self.builder,
            FunctionBuilder::new(String::new(), ReducedType::unit(), true),
        );
        self.install(entry, signature, builder);

        let functions = self
            .functions
            .into_iter()
            .enumerate()
            .map(|(index, function)| match function {
                Some(function) => Ok(function),
                None => Err(CodegenError::MissingFunction(index_of(index, "functions")?)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            functions = functions.len(),
            globals = self.globals.len(),
            "generated program"
        );
        Ok(Program {
            signatures: self.signatures.into_vec(),
            functions,
            globals: self.globals,
            texts: self.texts.into_vec(),
            entry,
        })
    }

    fn emit_item(&mut self, item: &IrItem) -> Result<(), CodegenError> {
        if let Some((path, function)) = function_binding(item) {
            let IrItem::Let { value, .. } = item else {
                return Ok(());
            };
            let index = self.direct.get(&path).copied();
            let name = self.path_name(path);
            self.lift(name, value.span, &value.value.ty, function, None, index)?;
            return Ok(());
        }
        match item {
            IrItem::Let { pattern, value } => self.emit_binding(pattern, value),
            IrItem::Expression(node) => {
                self.emit_expr(node)?;
                self.push(Instruction::Drop);
                Ok(())
            }
        }
    }

    fn reserve(&mut self) -> Result<u32, CodegenError> {
        let index = index_of(self.functions.len(), "functions")?;
        self.functions.push(None);
        Ok(index)
    }

    fn install(&mut self, index: u32, signature: SignatureId, builder: FunctionBuilder) {
        if let Some(slot) = self.functions.get_mut(index as usize) {
            *slot = Some(EncodedFunction {
                name: builder.name,
                signature,
                locals: builder.locals,
                body: builder.body,
            });
        }
    }

    fn push(&mut self, instruction: Instruction) {
        self.builder.body.push(instruction);
    }

    fn erase(&self, ty: &Type) -> Result<ReducedType, CodegenError> {
        erase(ty, self.universe)
    }

    fn path_name(&self, path: Path) -> String {
        match self.interner {
            Some(interner) => interner.lookup(path.name).to_owned(),
            None => format!("${}", path.salt),
        }
    }

    /// Domain and codomain of a function type, through aliases.
    fn function_parts(&self, span: Span, ty: &Type) -> Result<(Type, Type), CodegenError> {
        match structural(self.universe, ty)? {
            Type::Function(domain, codomain) => Ok((*domain, *codomain)),
            _ => Err(CodegenError::NotAFunction(span)),
        }
    }

    fn function_signature(&mut self, span: Span, ty: &Type) -> Result<SignatureId, CodegenError> {
        let (domain, codomain) = self.function_parts(span, ty)?;
        let param = self.erase(&domain)?;
        let result = self.erase(&codomain)?;
        self.signatures.intern(param, result)
    }

    /// Give `path` storage in the current function.
    fn declare(&mut self, path: Path, ty: &Type) -> Result<Storage, CodegenError> {
        let ty = self.erase(ty)?;
        if self.builder.module_level {
            if let Some(&slot) = self.global_slots.get(&path) {
                return Ok(Storage::Global(slot));
            }
            let slot = index_of(self.globals.len(), "globals")?;
            let name = self.path_name(path);
            self.globals.push(Global { name, ty });
            self.global_slots.insert(path, slot);
            return Ok(Storage::Global(slot));
        }
        if let Some(&slot) = self.builder.bindings.get(&path) {
            return Ok(Storage::Local(slot));
        }
        let slot = self.builder.temp(ty)?;
        self.builder.bindings.insert(path, slot);
        Ok(Storage::Local(slot))
    }

    fn storage(&self, path: Path) -> Result<Storage, CodegenError> {
        if let Some(&slot) = self.builder.bindings.get(&path) {
            return Ok(Storage::Local(slot));
        }
        if let Some(&slot) = self.global_slots.get(&path) {
            return Ok(Storage::Global(slot));
        }
        Err(CodegenError::UnboundName(path))
    }

    fn store(&mut self, path: Path) -> Result<(), CodegenError> {
        let instruction = match self.storage(path)? {
            Storage::Local(slot) => Instruction::LocalSet(slot),
            Storage::Global(slot) => Instruction::GlobalSet(slot),
        };
        self.push(instruction);
        Ok(())
    }

    /// Lift `function` into its own encoded function and return its index.
    /// `recursive` names a capture that refers to the closure itself.
    fn lift(
        &mut self,
        name: String,
        span: Span,
        ty: &Type,
        function: &IrFunction,
        recursive: Option<Path>,
        reserved: Option<u32>,
    ) -> Result<u32, CodegenError> {
        let index = match reserved {
            Some(index) => index,
            None => self.reserve()?,
        };
        let (domain, _) = self.function_parts(span, ty)?;
        let param = self.erase(&domain)?;
        let signature = self.function_signature(span, ty)?;

        let mut builder = FunctionBuilder::new(name, param, false);
        if let Some(param) = &function.param {
            builder.bindings.insert(param.path, 0);
        }
        let mut slots = Vec::new();
        for capture in &function.captures {
            if Some(capture.value) == recursive {
                continue;
            }
            let slot = builder.temp(self.erase(&capture.ty)?)?;
            builder.bindings.insert(capture.value, slot);
            slots.push(slot);
        }
        if let Some(path) = recursive {
            builder
                .recursive
                .insert(path, SelfClosure { function: index, slots });
        }

        let outer = mem::replace(&mut self.builder, builder);
        let result = self.emit_expr(&function.body);
        let builder = mem::replace(&mut self.builder, outer);
        result?;
        tracing::trace!(index, name = %builder.name, "lifted function");
        self.install(index, signature, builder);
        Ok(index)
    }

    /// Lift `node` and leave a closure over it on the stack.
    fn emit_closure(&mut self, node: &IrNode, function: &IrFunction, recursive: Option<Path>) -> Result<(), CodegenError> {
        let name = format!("{}${}", self.builder.name, self.functions.len());
        let index = self.lift(name, node.span, &node.value.ty, function, recursive, None)?;
        let mut captured = 0u32;
        for capture in &function.captures {
            if Some(capture.value) == recursive {
                continue;
            }
            self.emit_path(node.span, &capture.ty, capture.value)?;
            captured += 1;
        }
        if captured == 0 {
            self.push(Instruction::FunctionRef(index));
        } else {
            self.push(Instruction::MakeClosure {
                function: index,
                captures: captured,
            });
        }
        Ok(())
    }

    /// Load the value named by `path`; `ty` is the type at this use.
    fn emit_path(&mut self, span: Span, ty: &Type, path: Path) -> Result<(), CodegenError> {
        if let Some(&slot) = self.builder.bindings.get(&path) {
            self.push(Instruction::LocalGet(slot));
            return Ok(());
        }
        if let Some(closure) = self.builder.recursive.get(&path).cloned() {
            for &slot in &closure.slots {
                self.push(Instruction::LocalGet(slot));
            }
            if closure.slots.is_empty() {
                self.push(Instruction::FunctionRef(closure.function));
            } else {
                self.push(Instruction::MakeClosure {
                    function: closure.function,
                    captures: index_of(closure.slots.len(), "captures")?,
                });
            }
            return Ok(());
        }
        if let Some(&index) = self.direct.get(&path) {
            self.push(Instruction::FunctionRef(index));
            return Ok(());
        }
        if let Some(&slot) = self.global_slots.get(&path) {
            self.push(Instruction::GlobalGet(slot));
            return Ok(());
        }
        if let Some(info) = self.universe.constructor(path) {
            let tag = info.tag;
            if info.payload.is_none() {
                self.push(Instruction::MakeVariant {
                    tag,
                    has_payload: false,
                });
            } else {
                let index = self.constructor_wrapper(path)?;
                self.push(Instruction::FunctionRef(index));
            }
            return Ok(());
        }
        if let Some(op) = self.universe.intrinsic(path) {
            let index = self.operator_wrapper(span, op, ty)?;
            self.push(Instruction::FunctionRef(index));
            return Ok(());
        }
        Err(CodegenError::UnboundName(path))
    }
}
