//! Parse context flags for context-sensitive parsing.
//!
//! A record literal is a name immediately followed by `{`, which collides
//! with `match x { ... }`. The scrutinee is parsed with
//! [`ParseContext::NO_RECORD_LIT`]; every bracketed sub-expression clears
//! the flag again.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseContext(u16);

impl ParseContext {
    pub const NONE: Self = Self(0);

    /// `name {` does not start a record literal here.
    pub const NO_RECORD_LIT: Self = Self(1 << 0);

    #[inline]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    #[inline]
    #[must_use]
    pub const fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}
