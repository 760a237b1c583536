//! Immutable cons cells over lazily-forced values and tails.

use std::sync::Arc;

use crate::error::Result;
use crate::rank::Rank;
use crate::thunk::Thunk;

/// A handle to an immutable [`Node`], shared by reference across operator
/// results so structural sharing is free.
pub type NodeRef<T> = Arc<Node<T>>;

/// An immutable cons cell: a lazy value, an eagerly-known rank, and a lazy
/// tail. A node's `rank` is always known at construction time; `value` and
/// `tail` are forced on demand and memoized.
pub struct Node<T> {
    pub(crate) value: Arc<Thunk<T>>,
    pub(crate) rank: Rank,
    pub(crate) tail: Arc<Thunk<Option<NodeRef<T>>>>,
}

impl<T> Node<T> {
    /// The eagerly-known rank of this node.
    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Builds a node from an explicit value thunk, rank, and tail thunk.
    pub fn make_node(
        value: Arc<Thunk<T>>,
        rank: Rank,
        tail: Arc<Thunk<Option<NodeRef<T>>>>,
    ) -> NodeRef<T> {
        Arc::new(Self { value, rank, tail })
    }

    /// Builds a terminal node: a forced value at `rank` with no successor.
    pub fn terminal(value: T, rank: Rank) -> NodeRef<T>
    where
        T: Send + 'static,
    {
        Self::make_node(
            Arc::new(Thunk::new_forced(value)),
            rank,
            Arc::new(Thunk::new_forced(None)),
        )
    }

    /// Builds a node from a forced value at `rank` followed by `next`.
    pub fn node(value: T, rank: Rank, next: NodeRef<T>) -> NodeRef<T>
    where
        T: Send + 'static,
    {
        Self::make_node(
            Arc::new(Thunk::new_forced(value)),
            rank,
            Arc::new(Thunk::new_forced(Some(next))),
        )
    }

    /// Builds a node from a forced value at `rank` whose tail is computed
    /// lazily by `tail_closure` on first demand.
    pub fn lazy_node<F>(value: T, rank: Rank, tail_closure: F) -> NodeRef<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<Option<NodeRef<T>>> + Send + 'static,
    {
        Self::make_node(
            Arc::new(Thunk::new_forced(value)),
            rank,
            Arc::new(Thunk::new_deferred(tail_closure)),
        )
    }
}
