//! `merge_apply`: monadic bind, merging every `f(value)` ranking (shifted by
//! its source's rank) into a single non-decreasing sequence.

use std::sync::Arc;

use super::merge::merge_nodes;
use crate::error::{RankedError, Result};
use crate::node::NodeRef;
use crate::ranking::Ranking;

impl<T> Ranking<T>
where
    T: Clone + Send + 'static,
{
    /// Applies `f` to every value, shifts each result by its source node's
    /// rank, and merges all of the shifted rankings into one sequence.
    ///
    /// `f(v_{i+1})` is only evaluated once the already-known rank of the
    /// `i+1`-th input node can no longer be excluded — that is, once the
    /// merged output so far has risen to or past it. An input node's rank is
    /// always available without forcing its value, so this bound never
    /// requires forcing ahead of what the caller actually observes.
    ///
    /// # Errors
    ///
    /// Propagates any error raised forcing an input value, calling `f`, or
    /// shifting ranks (an offending `f(v)` whose ranks overflow when shifted).
    pub fn merge_apply<U, F, E>(&self, f: F, dedup: bool) -> Result<Ranking<U>>
    where
        U: Clone + Send + 'static,
        F: Fn(T) -> std::result::Result<Ranking<U>, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let head = match &self.head {
            Some(n) => bind_from(Arc::clone(n), f)?,
            None => None,
        };
        Ok(Ranking { head, dedup })
    }
}

/// Binds `input` onward: forces its value, applies `f`, shifts the result by
/// `input.rank`, then merges that shifted chain against whatever remains of
/// `input`'s tail.
fn bind_from<T, U, F, E>(input: NodeRef<T>, f: Arc<F>) -> Result<Option<NodeRef<U>>>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: Fn(T) -> std::result::Result<Ranking<U>, E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let value = input.value.force()?;
    let ranking_u = f(value).map_err(RankedError::from_callback)?;
    let dedup = ranking_u.dedup;
    let shifted = ranking_u.shift_ranks(input.rank, dedup)?;
    let rest_input = input.tail.force()?;
    merge_bounded(shifted.head, rest_input, f)
}

/// Merges an already-bound `U` chain (`current`) against `rest_input`, an
/// as-yet-unbound suffix of the original input. `rest_input`'s head rank is
/// read without forcing any value, so comparing it against `current`'s rank
/// never triggers an unnecessary call to `f`.
fn merge_bounded<T, U, F, E>(
    current: Option<NodeRef<U>>,
    rest_input: Option<NodeRef<T>>,
    f: Arc<F>,
) -> Result<Option<NodeRef<U>>>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: Fn(T) -> std::result::Result<Ranking<U>, E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    match (current, rest_input) {
        (None, None) => Ok(None),
        (None, Some(next)) => bind_from(next, f),
        (Some(c), None) => Ok(Some(c)),
        (Some(c), Some(next)) => {
            if c.rank <= next.rank {
                let rank = c.rank;
                let value = Arc::clone(&c.value);
                let tail = {
                    let next = Arc::clone(&next);
                    Arc::new(crate::thunk::Thunk::new_deferred(move || {
                        let c_tail = c.tail.force()?;
                        merge_bounded(c_tail, Some(next), f)
                    }))
                };
                Ok(Some(crate::node::Node::make_node(value, rank, tail)))
            } else {
                let bound = bind_from(Arc::clone(&next), f)?;
                match bound {
                    None => Ok(Some(c)),
                    Some(b) => Ok(Some(merge_nodes(c, b))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::from_values_sequential;
    use crate::rank::Rank;
    use std::convert::Infallible;

    #[test]
    fn merge_apply_shifts_and_merges_each_branch() {
        let r = from_values_sequential(vec![1, 2], Rank::zero(), true).unwrap();
        let bound = r
            .merge_apply(
                |v: i32| {
                    Ok::<_, Infallible>(Ranking::singleton(
                        v * 10,
                        Rank::from_value(u64::from(v as u32)).unwrap(),
                        true,
                    ))
                },
                true,
            )
            .unwrap();
        assert_eq!(
            bound.take_n(10).unwrap(),
            vec![
                (10, Rank::from_value(1).unwrap()),
                (20, Rank::from_value(3).unwrap()),
            ]
        );
    }

    #[test]
    fn merge_apply_interleaves_multi_element_branches() {
        let r = from_values_sequential(vec![0, 1], Rank::zero(), true).unwrap();
        let bound = r
            .merge_apply(
                |v: i32| {
                    Ok::<_, Infallible>(
                        from_values_sequential(vec![v, v], Rank::zero(), true).unwrap(),
                    )
                },
                true,
            )
            .unwrap();
        assert_eq!(
            bound.take_n(10).unwrap(),
            vec![
                (0, Rank::zero()),
                (0, Rank::from_value(1).unwrap()),
                (1, Rank::from_value(1).unwrap()),
                (1, Rank::from_value(2).unwrap()),
            ]
        );
    }

    #[test]
    fn merge_apply_on_empty_input_is_empty() {
        let r: Ranking<i32> = Ranking::empty(true);
        let bound = r
            .merge_apply(
                |v: i32| Ok::<_, Infallible>(Ranking::singleton(v, Rank::zero(), true)),
                true,
            )
            .unwrap();
        assert!(bound.is_empty());
    }
}
