//! Error recovery for the parser.
//!
//! A failing production says how far the cursor should be moved before
//! parsing resumes ([`RecoveryBehavior`]); whoever catches the failure
//! applies it with [`recover`]. Token sets use a bitset over
//! [`TokenKind::discriminant_index`] for O(1) membership.

use tarn_ir::TokenKind;

use crate::cursor::Cursor;

/// A set of token kinds. Bit `n` is the kind with discriminant index `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TokenSet(u128);

impl TokenSet {
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    #[must_use]
    #[allow(clippy::needless_pass_by_value)] // const fn builder for static initialization
    pub const fn with(self, kind: TokenKind) -> Self {
        Self(self.0 | (1u128 << kind.discriminant_index()))
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(&self, kind: &TokenKind) -> bool {
        (self.0 & (1u128 << kind.discriminant_index())) != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Tokens that can only begin a statement.
pub const STATEMENT_START: TokenSet = TokenSet::new()
    .with(TokenKind::Let)
    .with(TokenKind::Type)
    .with(TokenKind::Mod);

/// Where the enclosing statement loop can pick up again without skipping.
pub const STATEMENT_BOUNDARY: TokenSet = STATEMENT_START
    .with(TokenKind::RBrace)
    .with(TokenKind::Eof);

/// How far to move the cursor after a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryBehavior {
    /// The failure site already left the cursor where parsing can resume.
    None,
    /// Skip to the matching close token and consume it.
    SkipUntilToken(TokenKind),
    /// Stop before the first depth-0 token in the set.
    SkipUntilCategory(TokenSet),
    /// Consume through the next depth-0 `;`, or stop before an unmatched
    /// `}` or `Eof`.
    SkipToStatement,
}

/// Apply `behavior`. Returns whether its target was reached; `None` always
/// counts as reached.
///
/// Every walk tracks bracket nesting, so tokens inside a nested `( )`,
/// `[ ]` or `{ }` never stop it. A depth-0 close delimiter that does not
/// match anything being skipped ends a token or category walk early (it
/// belongs to an enclosing construct), and so does a depth-0 `;` when the
/// target is not itself `;`.
pub fn recover(cursor: &mut Cursor<'_>, behavior: RecoveryBehavior) -> bool {
    let start = cursor.position();
    let reached = match behavior {
        RecoveryBehavior::None => true,
        RecoveryBehavior::SkipUntilToken(target) => skip_until_token(cursor, target),
        RecoveryBehavior::SkipUntilCategory(set) => skip_until_category(cursor, set),
        RecoveryBehavior::SkipToStatement => skip_to_statement(cursor),
    };
    tracing::trace!(
        ?behavior,
        skipped = cursor.position() - start,
        reached,
        "recovered"
    );
    reached
}

fn skip_until_token(cursor: &mut Cursor<'_>, target: TokenKind) -> bool {
    let mut depth = 0usize;
    loop {
        let kind = cursor.current_kind();
        if kind == TokenKind::Eof {
            return false;
        }
        if depth == 0 {
            if kind.same_kind(&target) {
                cursor.advance();
                return true;
            }
            if kind.is_close_delimiter() || kind == TokenKind::Semicolon {
                return false;
            }
        }
        if kind.is_open_delimiter() {
            depth += 1;
        } else if kind.is_close_delimiter() {
            depth -= 1;
        }
        cursor.advance();
    }
}

fn skip_until_category(cursor: &mut Cursor<'_>, set: TokenSet) -> bool {
    let mut depth = 0usize;
    loop {
        let kind = cursor.current_kind();
        if depth == 0 && set.contains(&kind) {
            return true;
        }
        if kind == TokenKind::Eof || (depth == 0 && kind.is_close_delimiter()) {
            return false;
        }
        if kind.is_open_delimiter() {
            depth += 1;
        } else if kind.is_close_delimiter() {
            depth -= 1;
        }
        cursor.advance();
    }
}

fn skip_to_statement(cursor: &mut Cursor<'_>) -> bool {
    let mut depth = 0usize;
    loop {
        let kind = cursor.current_kind();
        match kind {
            TokenKind::Eof => return false,
            TokenKind::Semicolon if depth == 0 => {
                cursor.advance();
                return true;
            }
            TokenKind::RBrace if depth == 0 => return false,
            _ => {}
        }
        if kind.is_open_delimiter() {
            depth += 1;
        } else if kind.is_close_delimiter() {
            // A stray `)` or `]` at depth 0 is just skipped.
            depth = depth.saturating_sub(1);
        }
        cursor.advance();
    }
}
