//! Error types for ranking-function operations.

use std::sync::Arc;
use thiserror::Error;

/// Errors that can arise from rank arithmetic, thunk forcing, or user callbacks.
#[derive(Debug, Clone, Error)]
pub enum RankedError {
    /// Rank arithmetic exceeded `Rank::MAX_FINITE`.
    #[error("rank overflow: sum exceeds max finite rank ({})", crate::Rank::MAX_FINITE_VALUE)]
    Overflow,

    /// Subtraction would have yielded a negative rank.
    #[error("rank underflow: {minuend} - {subtrahend} is negative")]
    Underflow {
        /// The left-hand operand of the subtraction.
        minuend: u64,
        /// The right-hand operand of the subtraction.
        subtrahend: u64,
    },

    /// `a - b` was attempted with `b = infinity` and `a` finite.
    #[error("cannot subtract infinity from a finite rank")]
    InfiniteSubtraction,

    /// A user-supplied generator or `map_with_rank` produced a rank that
    /// violates the non-decreasing-rank invariant.
    #[error("rank order violation: rank {next} follows previously emitted rank {previous}")]
    RankOrderViolation {
        /// The most recently emitted rank.
        previous: crate::Rank,
        /// The rank that would have been emitted next, violating monotonicity.
        next: crate::Rank,
    },

    /// A thunk's closure tried to force the same thunk during its own evaluation.
    #[error("thunk forced itself recursively during evaluation")]
    RecursiveForce,

    /// Wraps an error raised by a user-supplied callback (map, filter,
    /// generator, merge_apply binder, predicate).
    #[error("callback error: {0}")]
    CallbackError(#[from] CallbackFailure),
}

impl RankedError {
    /// Wraps an arbitrary user callback error as a [`RankedError::CallbackError`].
    pub fn from_callback<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CallbackError(CallbackFailure(Arc::new(err)))
    }

    /// True for the pure rank-arithmetic variants (`Overflow`, `Underflow`,
    /// `InfiniteSubtraction`); false for protocol and callback errors.
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Overflow | Self::Underflow { .. } | Self::InfiniteSubtraction
        )
    }
}

/// A type-erased, cloneable wrapper around a user callback's error.
///
/// Boxed as `Arc` (rather than `Box`) because a resolved [`crate::Thunk`]
/// caches its outcome and replays it verbatim to every subsequent forcer;
/// `RankedError` must stay `Clone` to support that replay.
#[derive(Debug, Clone)]
pub struct CallbackFailure(pub(crate) Arc<dyn std::error::Error + Send + Sync>);

impl std::fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CallbackFailure {}

pub(crate) type Result<T> = std::result::Result<T, RankedError>;
