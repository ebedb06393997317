use tarn_ir::{Path, Span};

/// A broken invariant met during generation. Well-typed input never
/// produces one; when it happens the module is abandoned.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("an unresolved type reached erasure")]
    ErasureGap,
    #[error("no type definition for `{0:?}`")]
    UnknownType(Path),
    #[error("instantiation supplies {found} type argument(s) but the definition takes {expected}")]
    InstantiationArity {
        path: Path,
        expected: u32,
        found: usize,
    },
    #[error("`{0:?}` has no storage in this function")]
    UnboundName(Path),
    #[error("an error node at {0:?} reached code generation")]
    ErrorNode(Span),
    #[error("expected a function type at {0:?}")]
    NotAFunction(Span),
    #[error("expected a record type at {0:?}")]
    NotARecord(Span),
    #[error("expected an array type at {0:?}")]
    NotAnArray(Span),
    #[error("record has no field for the projection at {0:?}")]
    UnknownField(Span),
    #[error("function {0} was reserved but never emitted")]
    MissingFunction(u32),
    #[error("more {0} than a 32-bit index can address")]
    IndexOverflow(&'static str),
}

/// `value` as a 32-bit table index or count.
pub(crate) fn index_of(value: usize, what: &'static str) -> Result<u32, CodegenError> {
    u32::try_from(value).map_err(|_| CodegenError::IndexOverflow(what))
}
