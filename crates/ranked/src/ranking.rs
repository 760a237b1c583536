//! The `Ranking<T>` handle: an optional head node plus a deduplication flag.

use crate::error::Result;
use crate::node::NodeRef;
use crate::rank::Rank;

/// A possibly-infinite, non-decreasing sequence of `(value, rank)` pairs.
///
/// `Ranking<T>` is an immutable handle: `head` points at the first node (if
/// any), and `dedup` governs iteration only — it never rewrites the stored
/// nodes. Cloning a `Ranking` is O(1) (it clones an `Option<Arc<Node<T>>>`).
#[derive(Clone)]
pub struct Ranking<T> {
    pub(crate) head: Option<NodeRef<T>>,
    pub(crate) dedup: bool,
}

impl<T> Ranking<T> {
    /// The empty ranking.
    #[must_use]
    pub fn empty(dedup: bool) -> Self {
        Self { head: None, dedup }
    }

    /// A ranking with the one node `(value, rank)`.
    pub fn singleton(value: T, rank: Rank, dedup: bool) -> Self
    where
        T: Send + 'static,
    {
        Self {
            head: Some(crate::node::Node::terminal(value, rank)),
            dedup,
        }
    }

    /// Non-forcing check of whether this ranking has any elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Whether iteration over this ranking suppresses adjacent duplicate
    /// values.
    #[must_use]
    pub fn is_deduplicating(&self) -> bool {
        self.dedup
    }

    /// Returns a ranking identical to this one but with the deduplication
    /// flag set to `dedup`. O(1): the underlying nodes are shared.
    #[must_use]
    pub fn with_dedup(&self, dedup: bool) -> Self {
        Self {
            head: self.head.clone(),
            dedup,
        }
    }

    /// Forces the head value (if any) and returns `(value, rank)` without
    /// forcing the tail.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while forcing the head's value thunk.
    pub fn first(&self) -> Result<Option<(T, Rank)>>
    where
        T: Clone,
    {
        match &self.head {
            None => Ok(None),
            Some(node) => Ok(Some((node.value.force()?, node.rank))),
        }
    }

    /// Forces the head value (if any) and returns it, discarding the rank.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while forcing the head's value thunk.
    pub fn most_normal(&self) -> Result<Option<T>>
    where
        T: Clone,
    {
        Ok(self.first()?.map(|(v, _)| v))
    }

    /// Forces the entire sequence and returns its length. Must not be called
    /// on an infinite ranking; it will not terminate.
    ///
    /// # Errors
    ///
    /// Propagates the first error encountered while forcing any node.
    pub fn size(&self) -> Result<usize>
    where
        T: Clone + PartialEq,
    {
        let mut count = 0;
        for item in self.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Collects up to `count` `(value, rank)` pairs, short-circuiting on the
    /// first error.
    ///
    /// # Errors
    ///
    /// Propagates the first error encountered while forcing any of the first
    /// `count` nodes.
    pub fn take_n(&self, count: usize) -> Result<Vec<(T, Rank)>>
    where
        T: Clone + PartialEq,
    {
        self.iter().take(count).collect()
    }
}
