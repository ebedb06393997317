//! Source location spans.
//!
//! A span is a start offset plus a width. Storing the width instead of an end
//! offset means a span whose end precedes its start cannot be built. A span
//! may reach past the end of the input; the parser uses that to point at a
//! delimiter that was expected but never written.

use std::fmt;

/// Error when creating a span from a range that does not fit in `u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// Span start position exceeds `u32::MAX`.
    StartTooLarge(usize),
    /// Span width exceeds `u32::MAX`.
    WidthTooLarge(usize),
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanError::StartTooLarge(v) => {
                write!(f, "span start {v} exceeds u32::MAX ({})", u32::MAX)
            }
            SpanError::WidthTooLarge(v) => {
                write!(f, "span width {v} exceeds u32::MAX ({})", u32::MAX)
            }
        }
    }
}

impl std::error::Error for SpanError {}

/// Source location span: `width` bytes starting at byte offset `start`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub width: u32,
}

impl Span {
    /// Placeholder for compiler-generated nodes.
    pub const DUMMY: Span = Span { start: 0, width: 0 };

    #[inline]
    pub const fn new(start: u32, width: u32) -> Self {
        Span { start, width }
    }

    /// Build a span from absolute byte offsets. An `end` before `start`
    /// produces an empty span at `start`.
    #[inline]
    pub const fn from_offsets(start: u32, end: u32) -> Self {
        Span {
            start,
            width: end.saturating_sub(start),
        }
    }

    /// Try to create a span from a byte range.
    pub fn try_from_range(range: std::ops::Range<usize>) -> Result<Self, SpanError> {
        let start =
            u32::try_from(range.start).map_err(|_| SpanError::StartTooLarge(range.start))?;
        let width = range.end.saturating_sub(range.start);
        let width = u32::try_from(width).map_err(|_| SpanError::WidthTooLarge(width))?;
        Ok(Span { start, width })
    }

    /// Create a span from a byte range.
    ///
    /// # Panics
    /// Panics if the range does not fit in `u32`. Sources are rejected long
    /// before reaching that size.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::try_from_range(range).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Zero-width span at `offset`.
    #[inline]
    pub const fn point(offset: u32) -> Span {
        Span {
            start: offset,
            width: 0,
        }
    }

    /// The exclusive end offset ("reach") of the span.
    #[inline]
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.width)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0
    }

    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end()
    }

    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Combine two spans: the minimum start and the maximum reach.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span::from_offsets(self.start.min(other.start), self.end().max(other.end()))
    }

    /// Zero-width span right after this one.
    #[inline]
    #[must_use]
    pub const fn after(self) -> Span {
        Span::point(self.end())
    }

    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end() as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.start, self.width)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// A value paired with the span of source text it came from.
#[derive(Clone, PartialEq, Debug)]
pub struct Tagged<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Tagged<T> {
    #[inline]
    pub const fn new(span: Span, value: T) -> Self {
        Tagged { span, value }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged {
            span: self.span,
            value: f(self.value),
        }
    }

    pub fn as_ref(&self) -> Tagged<&T> {
        Tagged {
            span: self.span,
            value: &self.value,
        }
    }
}

impl<T: Copy> Copy for Tagged<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn merge_covers_gap() {
        assert_eq!(Span::new(0, 3).merge(Span::new(5, 2)), Span::new(0, 7));
    }

    #[test]
    fn merge_is_order_independent() {
        let a = Span::new(10, 4);
        let b = Span::new(2, 3);
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b), Span::new(2, 12));
    }

    #[test]
    fn merge_with_nested_span_keeps_outer() {
        let outer = Span::new(4, 20);
        let inner = Span::new(6, 2);
        assert_eq!(outer.merge(inner), outer);
    }

    #[test]
    fn from_offsets_never_goes_negative() {
        assert_eq!(Span::from_offsets(9, 3), Span::point(9));
        assert_eq!(Span::from_offsets(3, 9), Span::new(3, 6));
    }

    #[test]
    fn point_past_end_of_input() {
        let source = "(1";
        let missing = Span::new(2, 1);
        assert!(missing.end() as usize > source.len());
        assert!(!missing.is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let span = Span::new(5, 3);
        assert!(!span.contains(4));
        assert!(span.contains(5));
        assert!(span.contains(7));
        assert!(!span.contains(8));
    }

    #[test]
    fn try_from_range_rejects_huge_start() {
        let huge = u32::MAX as usize + 1;
        assert_eq!(
            Span::try_from_range(huge..huge + 1),
            Err(SpanError::StartTooLarge(huge))
        );
    }

    #[test]
    fn tagged_map_keeps_span() {
        let tagged = Tagged::new(Span::new(1, 2), 21);
        let doubled = tagged.map(|v| v * 2);
        assert_eq!(doubled.span, Span::new(1, 2));
        assert_eq!(doubled.value, 42);
    }

    fn span() -> impl Strategy<Value = Span> {
        (0u32..10_000, 0u32..10_000).prop_map(|(start, width)| Span::new(start, width))
    }

    proptest! {
        #[test]
        fn merge_is_associative(a in span(), b in span(), c in span()) {
            prop_assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        }

        #[test]
        fn merge_is_tightest_cover(a in span(), b in span()) {
            let merged = a.merge(b);
            prop_assert!(merged.contains_span(a));
            prop_assert!(merged.contains_span(b));
            prop_assert_eq!(merged.start, a.start.min(b.start));
            prop_assert_eq!(merged.end(), a.end().max(b.end()));
        }
    }
}
