//! `normal_exceptional`: merging a primary ranking with a lazily invoked
//! fallback, without forcing the fallback until traversal moves past the
//! primary's head.

use std::sync::Arc;

use super::merge::merge_nodes;
use crate::error::{RankedError, Result};
use crate::node::Node;
use crate::rank::Rank;
use crate::ranking::Ranking;
use crate::thunk::Thunk;

impl<T> Ranking<T>
where
    T: Clone + Send + 'static,
{
    /// Merges `self` (the primary, "normal" ranking) with
    /// `shift_ranks(exceptional(), offset)` (the fallback, "exceptional"
    /// ranking). `exceptional` is a zero-argument closure producing the
    /// fallback lazily.
    ///
    /// If `self` is non-empty, `exceptional` is wrapped inside the tail
    /// thunk of a synthetic node carrying `self`'s own head value and rank,
    /// so it runs at most once and only once traversal moves past that head.
    /// If `self` is empty there is no head to defer behind, so `exceptional`
    /// is forced immediately.
    ///
    /// # Errors
    ///
    /// Propagates any error raised forcing `self`'s tail, calling
    /// `exceptional`, or shifting its ranks by `offset`.
    pub fn normal_exceptional<G, E>(
        &self,
        exceptional: G,
        offset: Rank,
        dedup: bool,
    ) -> Result<Ranking<T>>
    where
        G: FnOnce() -> std::result::Result<Ranking<T>, E> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        match &self.head {
            None => {
                let fallback = exceptional().map_err(RankedError::from_callback)?;
                let shifted = fallback.shift_ranks(offset, dedup)?;
                Ok(Ranking {
                    head: shifted.head,
                    dedup,
                })
            }
            Some(head) => {
                let value = Arc::clone(&head.value);
                let rank = head.rank;
                let rest = Arc::clone(&head.tail);
                let tail = Arc::new(Thunk::new_deferred(move || {
                    let rest_head = rest.force()?;
                    let fallback = exceptional().map_err(RankedError::from_callback)?;
                    let shifted = fallback.shift_ranks(offset, dedup)?;
                    Ok(match (rest_head, shifted.head) {
                        (None, None) => None,
                        (Some(a), None) => Some(a),
                        (None, Some(b)) => Some(b),
                        (Some(a), Some(b)) => Some(merge_nodes(a, b)),
                    })
                }));
                Ok(Ranking {
                    head: Some(Node::make_node(value, rank, tail)),
                    dedup,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::from_values_sequential;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn normal_head_is_available_without_invoking_the_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let n = Ranking::singleton("ok", Rank::zero(), true);
        let r = n
            .normal_exceptional(
                move || {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Ranking::singleton("fail", Rank::zero(), true))
                },
                Rank::from_value(1).unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(r.first().unwrap(), Some(("ok", Rank::zero())));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn traversing_past_the_head_invokes_the_fallback_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let n = Ranking::singleton("ok", Rank::zero(), true);
        let r = n
            .normal_exceptional(
                move || {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Ranking::singleton("fail", Rank::zero(), true))
                },
                Rank::from_value(1).unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(
            r.take_n(2).unwrap(),
            vec![("ok", Rank::zero()), ("fail", Rank::from_value(1).unwrap())]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        r.take_n(2).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_primary_forces_the_fallback_immediately() {
        let n: Ranking<&str> = Ranking::empty(true);
        let r = n
            .normal_exceptional(
                || Ok::<_, Infallible>(Ranking::singleton("fail", Rank::zero(), true)),
                Rank::from_value(1).unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(
            r.take_n(1).unwrap(),
            vec![("fail", Rank::from_value(1).unwrap())]
        );
    }

    #[test]
    fn multi_element_primary_interleaves_with_the_shifted_fallback() {
        let n = from_values_sequential(vec![1, 2], Rank::zero(), true).unwrap();
        let r = n
            .normal_exceptional(
                || from_values_sequential(vec![3], Rank::zero(), true),
                Rank::from_value(1).unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(
            r.take_n(3).unwrap(),
            vec![
                (1, Rank::zero()),
                (2, Rank::from_value(1).unwrap()),
                (3, Rank::from_value(1).unwrap()),
            ]
        );
    }
}
