//! Stack growth for deep recursion.
//!
//! The parser, lowering, inference and code generation all recurse over
//! trees whose depth is chosen by the user. Each of them wraps its recursive
//! step in [`ensure_sufficient_stack`], which grows the stack on demand on
//! native targets and is a plain call on wasm.

/// Grow when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const GROWTH: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROWTH, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: u32) -> u32 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
    }

    #[test]
    fn deep_recursion_completes() {
        assert_eq!(depth(200_000), 200_000);
    }

    #[test]
    fn returns_closure_value() {
        assert_eq!(ensure_sufficient_stack(|| "done"), "done");
    }
}
