//! Debug assertion macros for the ranking-function invariants.
//!
//! These macros are only active in debug builds (`#[cfg(debug_assertions)]`),
//! so there is zero overhead in release builds. Not every invariant is
//! mechanically checkable at a single call site: forcing no further than a
//! requested rank is a property of the operators' control flow rather than a
//! runtime value, so it has no corresponding macro here and is instead upheld
//! by construction in `ops/`. The non-decreasing-rank invariant is likewise
//! absent from this module: it is user-observable (a misbehaving generator or
//! `map_with_rank` callback can violate it), so it is enforced unconditionally
//! as `RankedError::RankOrderViolation` in the iterator's `next()`, rather than
//! only in debug builds.

// =============================================================================
// No forcing side effects
// =============================================================================

/// Assert that forcing the same thunk twice yields the same finite value.
///
/// Used in: `Thunk` unit tests (inline, not on the hot path).
macro_rules! debug_assert_force_idempotent {
    ($first:expr, $second:expr) => {
        debug_assert_eq!(
            $first, $second,
            "force idempotence violated: repeated force() produced different results"
        )
    };
}

// =============================================================================
// Ownership
// =============================================================================

/// Assert that an operator did not accidentally alias a predecessor's tail
/// with a node it is about to overwrite (it should share by `Arc::clone`,
/// never rebuild in place).
///
/// Used in: `merge`'s self-merge deep-copy path, to confirm the copy is a
/// distinct allocation from the original spine it mirrors.
macro_rules! debug_assert_distinct_allocation {
    ($original:expr, $copy:expr) => {
        debug_assert!(
            !std::sync::Arc::ptr_eq($original, $copy),
            "distinct-allocation invariant violated: deep-copied spine aliases the original node"
        )
    };
}

pub(crate) use debug_assert_distinct_allocation;
pub(crate) use debug_assert_force_idempotent;
