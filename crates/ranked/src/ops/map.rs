//! Element-wise transforms: `map`, `map_with_rank`, `map_with_index`.

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
    /// Maps every value through `f`, leaving ranks and structure untouched.
    ///
    /// `f` runs inside the value-thunk of the corresponding output node, so
    /// it executes at most once per node and only when that value is
    /// actually read; errors it raises propagate through the forcing caller
    /// rather than through this call.
    pub fn map<U, F, E>(&self, f: F, dedup: bool) -> Ranking<U>
    where
        U: Send + 'static,
        F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Ranking {
            head: self.head.as_ref().map(|n| map_node(n, f)),
            dedup,
        }
    }

    /// Maps `(value, rank)` through `f`, which returns the new `(value, rank)`
    /// pair. The new rank is computed eagerly at node construction (so a
    /// downstream operator can read it without forcing the value), so the
    /// new value is forced immediately too — the caller must ensure `f`
    /// preserves the non-decreasing-rank invariant; violating it produces an
    /// ill-formed ranking (later operators may surface
    /// [`RankedError::RankOrderViolation`] when they notice).
    ///
    /// # Errors
    ///
    /// Propagates any error raised forcing the head value or calling `f` on
    /// it (later nodes' errors surface when their tail is forced).
    pub fn map_with_rank<U, F, E>(&self, f: F, dedup: bool) -> Result<Ranking<U>>
    where
        U: Send + 'static,
        F: Fn(T, Rank) -> std::result::Result<(U, Rank), E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let head = self
            .head
            .as_ref()
            .map(|n| map_with_rank_node(n, f))
            .transpose()?;
        Ok(Ranking { head, dedup })
    }

    /// Like [`Ranking::map`], but `f` additionally receives the zero-based
    /// position of the element along the sequence.
    pub fn map_with_index<U, F, E>(&self, f: F, dedup: bool) -> Ranking<U>
    where
        U: Send + 'static,
        F: Fn(T, usize) -> std::result::Result<U, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Ranking {
            head: self.head.as_ref().map(|n| map_with_index_node(n, f, 0)),
            dedup,
        }
    }
}

fn map_node<T, U, F, E>(node: &NodeRef<T>, f: Arc<F>) -> NodeRef<U>
where
    T: Clone + Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let rank = node.rank;
    let value = {
        let node = Arc::clone(node);
        let f = Arc::clone(&f);
        Arc::new(Thunk::new_deferred(move || {
            let v = node.value.force()?;
            f(v).map_err(RankedError::from_callback)
        }))
    };
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(map_node(&next, f))),
            None => Ok(None),
        }))
    };
    Node::make_node(value, rank, tail)
}

fn map_with_rank_node<T, U, F, E>(node: &NodeRef<T>, f: Arc<F>) -> Result<NodeRef<U>>
where
    T: Clone + Send + 'static,
    U: Send + 'static,
    F: Fn(T, Rank) -> std::result::Result<(U, Rank), E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let v = node.value.force()?;
    let (new_value, new_rank) = f(v, node.rank).map_err(RankedError::from_callback)?;
    let value = Arc::new(Thunk::new_forced(new_value));
    let tail = {
        let node = Arc::clone(node);
        let f = Arc::clone(&f);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(map_with_rank_node(&next, f)?)),
            None => Ok(None),
        }))
    };
    Ok(Node::make_node(value, new_rank, tail))
}

fn map_with_index_node<T, U, F, E>(node: &NodeRef<T>, f: Arc<F>, index: usize) -> NodeRef<U>
where
    T: Clone + Send + 'static,
    U: Send + 'static,
    F: Fn(T, usize) -> std::result::Result<U, E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let rank = node.rank;
    let value = {
        let node = Arc::clone(node);
        let f = Arc::clone(&f);
        Arc::new(Thunk::new_deferred(move || {
            let v = node.value.force()?;
            f(v, index).map_err(RankedError::from_callback)
        }))
    };
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(map_with_index_node(&next, f, index + 1))),
            None => Ok(None),
        }))
    };
    Node::make_node(value, rank, tail)
}
