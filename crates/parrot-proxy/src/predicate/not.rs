//! The single negation rule shared by every matcher.

/// Flip a raw match result when the expectation is negated.
#[inline]
pub fn apply_not(raw: bool, not: bool) -> bool {
    raw ^ not
}
