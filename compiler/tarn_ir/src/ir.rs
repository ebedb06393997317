//! Normalized intermediate representation.
//!
//! Lowering produces this tree from the AST: operators are calls, array
//! literals are push/append folds, literals are parsed, names are [`Path`]s.
//! Every node carries a type slot that starts as [`Type::Unresolved`] and is
//! written once by inference.

use crate::intrinsic::Intrinsic;
use crate::{Name, Path, Tagged, Type};

/// A payload with its type slot.
#[derive(Clone, PartialEq, Debug)]
pub struct Typed<T> {
    pub ty: Type,
    pub value: T,
}

impl<T> Typed<T> {
    pub fn unresolved(value: T) -> Self {
        Typed {
            ty: Type::Unresolved,
            value,
        }
    }

    pub fn with_type(value: T, ty: Type) -> Self {
        Typed { ty, value }
    }
}

pub type IrNode = Tagged<Typed<IrKind>>;
pub type Pattern = Tagged<Typed<PatternKind>>;

/// Fully parsed literal value.
#[derive(Clone, PartialEq, Debug)]
pub enum ConstValue {
    Unit,
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Char(char),
    /// The empty array every array literal starts from.
    EmptyArray,
}

#[derive(Clone, PartialEq, Debug)]
pub enum IrKind {
    Let {
        pattern: Pattern,
        value: Box<IrNode>,
        body: Box<IrNode>,
    },
    Const(ConstValue),
    Identifier(Path),
    Tuple(Vec<IrNode>),
    Record {
        path: Path,
        fields: Vec<(Tagged<Name>, IrNode)>,
    },
    Project {
        value: Box<IrNode>,
        field: Tagged<Name>,
    },
    Function(IrFunction),
    Call {
        callee: Box<IrNode>,
        argument: Box<IrNode>,
        hint: CallHint,
    },
    If {
        condition: Box<IrNode>,
        then_branch: Box<IrNode>,
        else_branch: Box<IrNode>,
    },
    Match {
        scrutinee: Box<IrNode>,
        patterns: Vec<Pattern>,
        branches: Vec<IrNode>,
    },
    /// Stands in for code that failed to resolve or parse. Inference gives
    /// it a fresh variable and code generation never sees it.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrFunction {
    /// `None` for `fn () => ...`.
    pub param: Option<IrParameter>,
    /// Outer locals used by the body, in first-use order.
    pub captures: Vec<Typed<Path>>,
    pub body: Box<IrNode>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrParameter {
    pub path: Path,
    pub hint: Option<Type>,
}

/// How a call can be emitted. Filled in after inference.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CallHint {
    Unresolved,
    /// Outermost call of a saturated prelude operation.
    Intrinsic(Intrinsic),
    /// Inner call of a chain resolved at its outermost call.
    Partial,
    /// Variant constructor applied to its payload.
    Constructor { tag: u32 },
    /// Call to a top-level function binding.
    Direct(Path),
    /// Call through a function value.
    Indirect,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PatternKind {
    Wildcard,
    Const(ConstValue),
    Binding(Path),
    Tuple(Vec<Pattern>),
    Array(ArrayPattern),
    Constructor {
        path: Path,
        payload: Option<Box<Pattern>>,
    },
    Hinted {
        pattern: Box<Pattern>,
        hint: Type,
    },
    Error,
}

/// Array pattern shapes. A rest binding has the type of the whole array.
#[derive(Clone, PartialEq, Debug)]
pub enum ArrayPattern {
    Exact(Vec<Pattern>),
    LeadingWithRest {
        leading: Vec<Pattern>,
        rest: Option<Path>,
    },
    TrailingWithRest {
        rest: Option<Path>,
        trailing: Vec<Pattern>,
    },
    Surrounding {
        leading: Vec<Pattern>,
        rest: Option<Path>,
        trailing: Vec<Pattern>,
    },
}

impl ArrayPattern {
    /// Element patterns before and after the rest.
    pub fn parts(&self) -> (&[Pattern], Option<Option<Path>>, &[Pattern]) {
        let none: &[Pattern] = &[];
        match self {
            ArrayPattern::Exact(items) => (items.as_slice(), None, none),
            ArrayPattern::LeadingWithRest { leading, rest } => {
                (leading.as_slice(), Some(*rest), none)
            }
            ArrayPattern::TrailingWithRest { rest, trailing } => {
                (none, Some(*rest), trailing.as_slice())
            }
            ArrayPattern::Surrounding {
                leading,
                rest,
                trailing,
            } => (leading.as_slice(), Some(*rest), trailing.as_slice()),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Pattern> {
        let (leading, _, trailing) = self.parts();
        leading.iter().chain(trailing.iter())
    }

    pub fn elements_mut(&mut self) -> Vec<&mut Pattern> {
        match self {
            ArrayPattern::Exact(items) => items.iter_mut().collect(),
            ArrayPattern::LeadingWithRest { leading, .. } => leading.iter_mut().collect(),
            ArrayPattern::TrailingWithRest { trailing, .. } => trailing.iter_mut().collect(),
            ArrayPattern::Surrounding {
                leading, trailing, ..
            } => leading.iter_mut().chain(trailing.iter_mut()).collect(),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum IrItem {
    Let { pattern: Pattern, value: IrNode },
    Expression(IrNode),
}

#[derive(Clone, PartialEq, Debug)]
pub struct IrModule {
    pub name: Name,
    pub items: Vec<IrItem>,
}

/// Constructors for lowering and tests.
pub mod build {
    use super::{CallHint, ConstValue, IrKind, IrNode, Pattern, PatternKind, Typed};
    use crate::{Path, Span, Tagged};

    pub fn node(span: Span, kind: IrKind) -> IrNode {
        Tagged::new(span, Typed::unresolved(kind))
    }

    pub fn constant(span: Span, value: ConstValue) -> IrNode {
        node(span, IrKind::Const(value))
    }

    pub fn ident(span: Span, path: Path) -> IrNode {
        node(span, IrKind::Identifier(path))
    }

    pub fn call(span: Span, callee: IrNode, argument: IrNode) -> IrNode {
        node(
            span,
            IrKind::Call {
                callee: Box::new(callee),
                argument: Box::new(argument),
                hint: CallHint::Unresolved,
            },
        )
    }

    pub fn pattern(span: Span, kind: PatternKind) -> Pattern {
        Tagged::new(span, Typed::unresolved(kind))
    }
}
