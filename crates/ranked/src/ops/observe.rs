//! `observe`: conditioning a ranking on a predicate, renormalizing so the
//! surviving most-normal element sits back at rank zero.

use std::convert::Infallible;
use std::sync::Arc;

use crate::error::Result;
use crate::node::{Node, NodeRef};
use crate::rank::Rank;
use crate::ranking::Ranking;
use crate::thunk::Thunk;

impl<T> Ranking<T>
where
    T: Clone + Send + 'static,
{
    /// Keeps only values satisfying `p` (as [`Ranking::filter`] does), then
    /// subtracts the surviving head's rank from every remaining rank so the
    /// new most-normal surviving element sits at rank zero — conditioning on
    /// an event shifts the plausibility scale, it does not collapse it.
    ///
    /// Because ranks are non-decreasing, the surviving head's rank is always
    /// the minimum among survivors, so no scan beyond the head is needed to
    /// find the normalization offset. If the surviving head's rank is
    /// infinite, nothing finite survived conditioning, so the result is
    /// empty; any infinite-ranked node encountered further down the chain is
    /// likewise dropped rather than renormalized.
    ///
    /// # Errors
    ///
    /// Propagates any error from the underlying `filter`.
    pub fn observe<P, E>(&self, p: P, dedup: bool) -> Result<Ranking<T>>
    where
        P: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let filtered = self.filter(p, dedup)?;
        normalize(filtered)
    }

    /// Conditions on equality with a specific `value` (a common case of
    /// [`Ranking::observe`]).
    ///
    /// # Errors
    ///
    /// See [`Ranking::observe`].
    pub fn observe_value(&self, value: T, dedup: bool) -> Result<Ranking<T>>
    where
        T: PartialEq,
    {
        self.observe(move |v: &T| Ok::<_, Infallible>(*v == value), dedup)
    }
}

fn normalize<T: Clone + Send + 'static>(r: Ranking<T>) -> Result<Ranking<T>> {
    let head = match &r.head {
        None => None,
        Some(h) if h.rank.is_infinity() => None,
        Some(h) => Some(normalize_node(h, h.rank)?),
    };
    Ok(Ranking {
        head,
        dedup: r.dedup,
    })
}

/// Subtracts `min_rank` from `node`'s rank (assumed finite — the caller only
/// invokes this on nodes already known not to be infinite) and recurses into
/// the tail, dropping the remainder of the chain at the first infinite-ranked
/// node encountered instead of renormalizing it.
fn normalize_node<T: Clone + Send + 'static>(
    node: &NodeRef<T>,
    min_rank: Rank,
) -> Result<NodeRef<T>> {
    let rank = (node.rank - min_rank)?;
    let value = Arc::clone(&node.value);
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) if next.rank.is_infinity() => Ok(None),
            Some(next) => Ok(Some(normalize_node(&next, min_rank)?)),
            None => Ok(None),
        }))
    };
    Ok(Node::make_node(value, rank, tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::from_values_sequential;

    #[test]
    fn observe_renormalizes_surviving_ranks_to_zero() {
        let r = from_values_sequential(vec![1, 2, 3, 4], Rank::zero(), true).unwrap();
        let observed = r.observe(|v: &i32| Ok::<_, Infallible>(*v >= 3), true).unwrap();
        assert_eq!(
            observed.take_n(10).unwrap(),
            vec![(3, Rank::zero()), (4, Rank::from_value(1).unwrap())]
        );
    }

    #[test]
    fn observe_on_an_already_normal_survivor_is_a_no_op() {
        let r = from_values_sequential(vec![1, 2], Rank::zero(), true).unwrap();
        let observed = r.observe(|_: &i32| Ok::<_, Infallible>(true), true).unwrap();
        assert_eq!(observed.take_n(2).unwrap(), r.take_n(2).unwrap());
    }

    #[test]
    fn observe_on_no_survivors_is_empty() {
        let r = from_values_sequential(vec![1, 2], Rank::zero(), true).unwrap();
        let observed = r.observe(|_: &i32| Ok::<_, Infallible>(false), true).unwrap();
        assert!(observed.is_empty());
    }

    #[test]
    fn observe_value_conditions_on_equality() {
        let r = from_values_sequential(vec![1, 2, 3], Rank::zero(), true).unwrap();
        let observed = r.observe_value(2, true).unwrap();
        assert_eq!(observed.take_n(10).unwrap(), vec![(2, Rank::zero())]);
    }

    #[test]
    fn observe_with_an_infinite_surviving_head_is_empty() {
        let r = Ranking::singleton(42, Rank::infinity(), true);
        let observed = r.observe(|_: &i32| Ok::<_, Infallible>(true), true).unwrap();
        assert!(observed.is_empty());
    }

    #[test]
    fn observe_drops_an_infinite_ranked_survivor_behind_a_finite_head() {
        use crate::constructors::from_list;
        let r = from_list(vec![(1, Rank::zero()), (2, Rank::infinity())], true);
        let observed = r.observe(|_: &i32| Ok::<_, Infallible>(true), true).unwrap();
        assert_eq!(observed.take_n(10).unwrap(), vec![(1, Rank::zero())]);
    }
}
