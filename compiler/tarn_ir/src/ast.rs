//! Surface syntax tree produced by the parser.
//!
//! Every node is wrapped in [`Tagged`] so later passes can point diagnostics
//! at exact source. The tree is built once per compile and never mutated.

use crate::token::Radix;
use crate::{Name, Tagged};

pub type Ident = Tagged<Name>;
pub type Expr = Tagged<ValueExpression>;
pub type Pat = Tagged<PatternExpression>;
pub type TypeExpr = Tagged<TypeExpression>;

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Integer arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // Real arithmetic
    AddReal,
    SubReal,
    MulReal,
    DivReal,
    // Text
    Concat,
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::AddReal => "+.",
            Self::SubReal => "-.",
            Self::MulReal => "*.",
            Self::DivReal => "/.",
            Self::Concat => "++",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Binding power; higher binds tighter.
    ///
    /// - 6: `*` `/` `%` `*.` `/.`
    /// - 5: `+` `-` `+.` `-.`
    /// - 4: `++`
    /// - 3: `==` `!=` `<` `<=` `>` `>=` (non-associative)
    /// - 2: `&&`
    /// - 1: `||`
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Rem | Self::MulReal | Self::DivReal => 6,
            Self::Add | Self::Sub | Self::AddReal | Self::SubReal => 5,
            Self::Concat => 4,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::And => 2,
            Self::Or => 1,
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }
}

/// A parsed module: its declared name and statements in source order.
#[derive(Clone, PartialEq, Debug)]
pub struct ParsedModule {
    pub name: Name,
    pub statements: Vec<Tagged<Statement>>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Statement {
    /// `let pattern = value;`
    Let { pattern: Pat, value: Expr },
    /// `expr;`
    Expression(Expr),
    /// `type name params = definition;`
    TypeDefinition(TypeDefinitionStatement),
    /// `mod name { statements }`
    Module {
        name: Ident,
        statements: Vec<Tagged<Statement>>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub struct TypeDefinitionStatement {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub definition: Tagged<TypeDefinition>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TypeDefinition {
    Record(Vec<RecordFieldDefinition>),
    Sum(Vec<VariantDefinition>),
    /// A bare type expression: the definition is an alias for it.
    Alias(TypeExpr),
}

#[derive(Clone, PartialEq, Debug)]
pub struct RecordFieldDefinition {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Clone, PartialEq, Debug)]
pub struct VariantDefinition {
    pub name: Ident,
    pub payload: Option<TypeExpr>,
}

/// Literal as written; numeric text is parsed during lowering.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Int { raw: Name, radix: Radix },
    Real(Name),
    Str(Name),
    Char(Name),
    Bool(bool),
    Unit,
}

/// A possibly module-qualified name: `a::b::name`, or just `name`.
#[derive(Clone, PartialEq, Debug)]
pub struct QualifiedName {
    pub modules: Vec<Ident>,
    pub name: Ident,
}

impl QualifiedName {
    pub fn unqualified(name: Ident) -> Self {
        QualifiedName {
            modules: Vec::new(),
            name,
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.modules.is_empty()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ValueExpression {
    /// `let pattern = value in body`
    Let {
        pattern: Box<Pat>,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Literal(Literal),
    Identifier(Name),
    /// `m::x`
    QualifiedPath(QualifiedName),
    Binary {
        op: Tagged<BinaryOp>,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: Tagged<UnaryOp>,
        operand: Box<Expr>,
    },
    /// `(+)`
    OperatorValue(BinaryOp),
    /// `(~-)`, `(!)`
    UnaryOperatorValue(UnaryOp),
    /// `fn a (b: int) => body`
    Function {
        params: Vec<Tagged<Parameter>>,
        body: Box<Expr>,
    },
    /// `fn | p1 => e1 | p2 => e2`
    MultiClauseFunction(Vec<MatchArm>),
    /// Juxtaposition `f x`; always a single argument.
    Call {
        callee: Box<Expr>,
        argument: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Tuple(Vec<Expr>),
    Array(Vec<Tagged<ArrayElement>>),
    /// `point { x = 1, y = 2 }`
    Record {
        name: QualifiedName,
        fields: Vec<RecordFieldInit>,
    },
    /// `value.field`
    FieldAccess { value: Box<Expr>, field: Ident },
    /// Placeholder for a region that failed to parse or lex.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Parameter {
    Named {
        name: Ident,
        hint: Option<TypeExpr>,
    },
    /// `()`
    Unit,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MatchArm {
    pub pattern: Pat,
    pub body: Expr,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ArrayElement {
    Single(Expr),
    /// `..xs`
    Splice(Expr),
}

#[derive(Clone, PartialEq, Debug)]
pub struct RecordFieldInit {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PatternExpression {
    Wildcard,
    Literal { literal: Literal, negated: bool },
    Identifier(Name),
    /// `m::Nil`
    QualifiedPath(QualifiedName),
    Tuple(Vec<Pat>),
    Array(ArrayPatternExpression),
    /// `Cons p`, `Nil`
    Constructor {
        name: QualifiedName,
        payload: Option<Box<Pat>>,
    },
    /// `(p: t)`
    TypeHinted { pattern: Box<Pat>, ty: TypeExpr },
}

/// The four shapes of array pattern. `rest` is `None` for a bare `..`.
#[derive(Clone, PartialEq, Debug)]
pub enum ArrayPatternExpression {
    /// `[a, b]`
    Exact(Vec<Pat>),
    /// `[a, ..rest]`
    LeadingWithRest { leading: Vec<Pat>, rest: Option<Ident> },
    /// `[..rest, z]`
    TrailingWithRest { rest: Option<Ident>, trailing: Vec<Pat> },
    /// `[a, ..rest, z]`
    Surrounding {
        leading: Vec<Pat>,
        rest: Option<Ident>,
        trailing: Vec<Pat>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub enum TypeExpression {
    /// `a -> b`
    Function {
        domain: Box<TypeExpr>,
        codomain: Box<TypeExpr>,
    },
    /// `list int`
    Application {
        head: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    Identifier(Name),
    /// `(a, b)`
    Product(Vec<TypeExpr>),
    /// `m::t`
    QualifiedPath(QualifiedName),
    /// `[a]`
    Array(Box<TypeExpr>),
    /// `()`
    Unit,
    Error,
}
