//! `filter`, `take`, and `take_while_rank`: dropping and truncating a ranking.

use std::sync::Arc;

use crate::error::{RankedError, Result};
use crate::node::{Node, NodeRef};
use crate::rank::Rank;
use crate::ranking::Ranking;
use crate::thunk::Thunk;

impl<T> Ranking<T>
where
    T: Clone + Send + 'static,
{
    /// Drops every node for which `p(value)` is false, preserving the ranks
    /// of retained nodes. The predicate is only evaluated as far as needed to
    /// find the next retained element, so filtering an infinite ranking whose
    /// remaining elements never satisfy `p` does not terminate — by design.
    ///
    /// # Errors
    ///
    /// Propagates any error raised forcing a value or evaluating `p` while
    /// searching for the first retained element.
    pub fn filter<P, E>(&self, p: P, dedup: bool) -> Result<Ranking<T>>
    where
        P: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let p = Arc::new(p);
        let head = match &self.head {
            Some(n) => filter_search(Arc::clone(n), p)?,
            None => None,
        };
        Ok(Ranking { head, dedup })
    }

    /// Truncates to the first `n` nodes. `n = 0` yields the empty ranking.
    #[must_use]
    pub fn take(&self, n: usize, dedup: bool) -> Ranking<T> {
        let head = if n == 0 {
            None
        } else {
            self.head.as_ref().map(|h| take_node(h, n))
        };
        Ranking { head, dedup }
    }

    /// Yields every node whose rank is `<= max_rank`, stopping at the first
    /// node with a greater rank (the non-decreasing-rank invariant guarantees
    /// no later node can qualify once one has been excluded).
    #[must_use]
    pub fn take_while_rank(&self, max_rank: Rank, dedup: bool) -> Ranking<T> {
        let head = self
            .head
            .as_ref()
            .filter(|h| h.rank <= max_rank)
            .map(|h| take_while_node(h, max_rank));
        Ranking { head, dedup }
    }
}

fn filter_search<T, P, E>(mut node: NodeRef<T>, p: Arc<P>) -> Result<Option<NodeRef<T>>>
where
    T: Clone + Send + 'static,
    P: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    loop {
        let value = node.value.force()?;
        let keep = p(&value).map_err(RankedError::from_callback)?;
        if keep {
            let rank = node.rank;
            let value_thunk = Arc::new(Thunk::new_forced(value));
            let tail = {
                let tail_thunk = Arc::clone(&node.tail);
                let p = Arc::clone(&p);
                Arc::new(Thunk::new_deferred(move || match tail_thunk.force()? {
                    Some(next) => filter_search(next, p),
                    None => Ok(None),
                }))
            };
            return Ok(Some(Node::make_node(value_thunk, rank, tail)));
        }
        match node.tail.force()? {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }
}

fn take_node<T: Clone + Send + 'static>(node: &NodeRef<T>, remaining: usize) -> NodeRef<T> {
    let rank = node.rank;
    let value = Arc::clone(&node.value);
    let tail = if remaining <= 1 {
        Arc::new(Thunk::new_forced(None))
    } else {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(take_node(&next, remaining - 1))),
            None => Ok(None),
        }))
    };
    Node::make_node(value, rank, tail)
}

fn take_while_node<T: Clone + Send + 'static>(node: &NodeRef<T>, max_rank: Rank) -> NodeRef<T> {
    let rank = node.rank;
    let value = Arc::clone(&node.value);
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) if next.rank <= max_rank => Ok(Some(take_while_node(&next, max_rank))),
            _ => Ok(None),
        }))
    };
    Node::make_node(value, rank, tail)
}
