//! Constructors building rankings from explicit enumerations and generators.

use std::sync::Arc;

use crate::error::{RankedError, Result};
use crate::node::{Node, NodeRef};
use crate::rank::Rank;
use crate::ranking::Ranking;
use crate::thunk::Thunk;

/// Builds a finite chain (most-exceptional node first) from already
/// rank-sorted pairs, by folding from the tail towards the head so every
/// node can be built with a forced tail.
fn chain_from_sorted<T: Send + 'static>(pairs: Vec<(T, Rank)>) -> Option<NodeRef<T>> {
    let mut tail: Option<NodeRef<T>> = None;
    for (value, rank) in pairs.into_iter().rev() {
        tail = Some(match tail {
            Some(next) => Node::node(value, rank, next),
            None => Node::terminal(value, rank),
        });
    }
    tail
}

/// Builds a ranking from an explicit finite sequence of `(value, rank)`
/// pairs. If the supplied order is already non-decreasing in rank it is
/// preserved; otherwise the constructor stable-sorts by ascending rank (first
/// occurrence wins ties) so the non-decreasing-rank invariant always holds.
pub fn from_list<T: Send + 'static>(mut pairs: Vec<(T, Rank)>, dedup: bool) -> Ranking<T> {
    let already_sorted = pairs.windows(2).all(|w| w[0].1 <= w[1].1);
    if !already_sorted {
        pairs.sort_by(|a, b| a.1.cmp(&b.1));
    }
    Ranking {
        head: chain_from_sorted(pairs),
        dedup,
    }
}

/// Builds a ranking where every value receives the same rank `r`.
pub fn from_values_uniform<T: Send + 'static>(values: Vec<T>, r: Rank, dedup: bool) -> Ranking<T> {
    let pairs = values.into_iter().map(|v| (v, r)).collect();
    Ranking {
        head: chain_from_sorted(pairs),
        dedup,
    }
}

/// Builds a ranking where value `i` (zero-based) receives rank
/// `start_rank + i`.
///
/// # Errors
///
/// Returns [`RankedError::Overflow`] if any assigned rank would exceed
/// `Rank::MAX_FINITE_VALUE`.
pub fn from_values_sequential<T: Send + 'static>(
    values: Vec<T>,
    start_rank: Rank,
    dedup: bool,
) -> Result<Ranking<T>> {
    let mut pairs = Vec::with_capacity(values.len());
    let mut rank = start_rank;
    for value in values {
        pairs.push((value, rank));
        rank = (rank + Rank::from_value(1)?)?;
    }
    Ok(Ranking {
        head: chain_from_sorted(pairs),
        dedup,
    })
}

/// Builds an infinite ranking where `g(i)` produces the `(value, rank)` at
/// index `i`, starting at `start_index`. `g` must return non-decreasing ranks
/// across successive indices; violations are a caller contract breach and are
/// not checked here (downstream operators that rely on non-decreasing ranks
/// may misbehave — see `RankedError::RankOrderViolation`).
///
/// The head is produced eagerly (by calling `g(start_index)` immediately, the
/// same way a finite constructor's first element is known up front); every
/// later element is produced lazily, one call to `g` per tail force.
///
/// # Errors
///
/// Propagates any error `g` raises at `start_index`.
pub fn from_generator<T, G, E>(g: G, start_index: u64, dedup: bool) -> Result<Ranking<T>>
where
    T: Send + 'static,
    G: Fn(u64) -> std::result::Result<(T, Rank), E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let g = Arc::new(g);
    let head = generator_node(Arc::clone(&g), start_index)?;
    Ok(Ranking {
        head: Some(head),
        dedup,
    })
}

fn generator_node<T, G, E>(g: Arc<G>, index: u64) -> Result<NodeRef<T>>
where
    T: Send + 'static,
    G: Fn(u64) -> std::result::Result<(T, Rank), E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let (value, rank) = g(index).map_err(RankedError::from_callback)?;
    let tail = {
        let g = Arc::clone(&g);
        Arc::new(Thunk::new_deferred(move || {
            generator_node(g, index + 1).map(Some)
        }))
    };
    Ok(Node::make_node(Arc::new(Thunk::new_forced(value)), rank, tail))
}

/// Builds an infinite ranking from a generator without a deduplication
/// handle (equivalent to `from_generator(g, start_index, false)`).
///
/// # Errors
///
/// Propagates any error `g` raises at `start_index`.
pub fn make_infinite_sequence<T, G, E>(g: G, start_index: u64) -> Result<Ranking<T>>
where
    T: Send + 'static,
    G: Fn(u64) -> std::result::Result<(T, Rank), E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    from_generator(g, start_index, false)
}
