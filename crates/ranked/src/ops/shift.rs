//! `shift_ranks`: adding a constant offset to every rank in a ranking.

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
    /// Adds `offset` to every rank. The head's new rank is computed eagerly
    /// (arithmetic can overflow past [`Rank::MAX_FINITE_VALUE`]), so a failing
    /// shift is reported immediately rather than deferred to first traversal.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RankedError::Overflow`] if the head's shifted
    /// rank would exceed [`Rank::MAX_FINITE_VALUE`]. Overflow on a later node
    /// surfaces when that node's tail is forced.
    pub fn shift_ranks(&self, offset: Rank, dedup: bool) -> Result<Ranking<T>> {
        let head = self
            .head
            .as_ref()
            .map(|n| shift_node(n, offset))
            .transpose()?;
        Ok(Ranking { head, dedup })
    }
}

fn shift_node<T: Clone + Send + 'static>(node: &NodeRef<T>, offset: Rank) -> Result<NodeRef<T>> {
    let rank = (node.rank + offset)?;
    let value = Arc::clone(&node.value);
    let tail = {
        let node = Arc::clone(node);
        Arc::new(Thunk::new_deferred(move || match node.tail.force()? {
            Some(next) => Ok(Some(shift_node(&next, offset)?)),
            None => Ok(None),
        }))
    };
    Ok(Node::make_node(value, rank, tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::from_values_sequential;
    use crate::error::RankedError;

    #[test]
    fn shift_adds_offset_to_every_rank() {
        let r = from_values_sequential(vec![1, 2, 3], Rank::zero(), true).unwrap();
        let shifted = r.shift_ranks(Rank::from_value(10).unwrap(), true).unwrap();
        assert_eq!(
            shifted.take_n(3).unwrap(),
            vec![
                (1, Rank::from_value(10).unwrap()),
                (2, Rank::from_value(11).unwrap()),
                (3, Rank::from_value(12).unwrap()),
            ]
        );
    }

    #[test]
    fn shift_reports_overflow_at_the_head_eagerly() {
        let r = Ranking::singleton(1, Rank::from_value(Rank::MAX_FINITE_VALUE).unwrap(), true);
        let err = r.shift_ranks(Rank::from_value(1).unwrap(), true).unwrap_err();
        assert!(matches!(err, RankedError::Overflow));
    }

    #[test]
    fn shift_reports_overflow_lazily_past_the_head() {
        let r = from_values_sequential(
            vec![1, 2],
            Rank::from_value(Rank::MAX_FINITE_VALUE - 1).unwrap(),
            true,
        )
        .unwrap();
        let shifted = r.shift_ranks(Rank::from_value(1).unwrap(), true).unwrap();
        assert_eq!(
            shifted.first().unwrap(),
            Some((1, Rank::from_value(Rank::MAX_FINITE_VALUE).unwrap()))
        );
        let err = shifted.take_n(2).unwrap_err();
        assert!(matches!(err, RankedError::Overflow));
    }
}
