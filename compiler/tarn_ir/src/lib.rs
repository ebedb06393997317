//! Tarn IR - shared data structures for the Tarn compiler.
//!
//! - Spans and [`Tagged`] nodes for source locations
//! - Interned [`Name`]s
//! - Tokens produced by the lexer
//! - The surface syntax tree ([`ast`])
//! - Resolved [`Path`]s
//! - Semantic [`Type`]s and [`AbstractType`] definitions
//! - The normalized, typed IR ([`ir`])
//! - Prelude [`Intrinsic`] operations

pub mod ast;
mod interner;
mod intrinsic;
pub mod ir;
mod path;
mod span;
mod token;
mod ty;

pub use interner::{Name, SharedInterner, StringInterner};
pub use intrinsic::Intrinsic;
pub use path::{Path, PathDisplay};
pub use span::{Span, SpanError, Tagged};
pub use token::{LexError, Radix, Token, TokenKind, TokenList};
pub use ty::{AbstractType, Type, TypeDisplay, TypeVar};
