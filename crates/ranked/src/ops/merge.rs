//! `merge` and `merge_all`: combining rankings by ascending rank, tie-broken
//! towards the left operand.

use std::sync::Arc;

use crate::error::Result;
use crate::invariants::debug_assert_distinct_allocation;
use crate::node::{Node, NodeRef};
use crate::ranking::Ranking;
use crate::thunk::Thunk;

impl<T> Ranking<T>
where
    T: Clone + Send + 'static,
{
    /// Merges `self` and `other` into a single non-decreasing sequence. At
    /// equal ranks, `self`'s node is yielded first. If `self` and `other`
    /// share the same underlying node allocation (e.g. `r.merge(&r, ...)`),
    /// the result is `self` unchanged when deduplication is enabled, and a
    /// genuine two-copy duplication otherwise (a value merged with itself
    /// must still appear twice when duplicates are not suppressed).
    #[must_use]
    pub fn merge(&self, other: &Ranking<T>, dedup: bool) -> Ranking<T> {
        let head = match (&self.head, &other.head) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => {
                if dedup {
                    Some(Arc::clone(a))
                } else {
                    let copy = deep_copy_spine(a);
                    debug_assert_distinct_allocation!(a, &copy);
                    Some(merge_nodes(Arc::clone(a), copy))
                }
            }
            (Some(a), Some(b)) => Some(merge_nodes(Arc::clone(a), Arc::clone(b))),
            (Some(a), None) => Some(Arc::clone(a)),
            (None, Some(b)) => Some(Arc::clone(b)),
            (None, None) => None,
        };
        Ranking { head, dedup }
    }

    /// Folds [`Ranking::merge`] across `rankings` left to right. Returns the
    /// empty ranking for an empty slice.
    #[must_use]
    pub fn merge_all(rankings: &[Ranking<T>], dedup: bool) -> Ranking<T> {
        let mut acc = Ranking::empty(dedup);
        for r in rankings {
            acc = acc.merge(r, dedup);
        }
        acc
    }
}

/// Interleaves two node chains by ascending rank; `a` wins ties.
pub(crate) fn merge_nodes<T: Clone + Send + 'static>(a: NodeRef<T>, b: NodeRef<T>) -> NodeRef<T> {
    let (first, first_is_a, rest_of_first, other) = if a.rank <= b.rank {
        (Arc::clone(&a), true, a, b)
    } else {
        (Arc::clone(&b), false, b, a)
    };
    let rank = first.rank;
    let value = Arc::clone(&first.value);
    let tail = Arc::new(Thunk::new_deferred(move || {
        match rest_of_first.tail.force()? {
            Some(next) => Ok(Some(if first_is_a {
                merge_nodes(next, other)
            } else {
                merge_nodes(other, next)
            })),
            None => Ok(Some(other)),
        }
    }));
    Node::make_node(value, rank, tail)
}

/// Builds a structurally fresh spine mirroring `node`, reusing the original's
/// value thunks (values are immutable once produced) but constructing new
/// `Node` and tail-thunk allocations so the copy is never `Arc::ptr_eq` to
/// any node in the original spine.
fn deep_copy_spine<T: Clone + Send + 'static>(node: &NodeRef<T>) -> NodeRef<T> {
    let rank = node.rank;
    let value = Arc::clone(&node.value);
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(deep_copy_spine(&next))),
            None => Ok(None),
        }))
    };
    Node::make_node(value, rank, tail)
}
