//! Pull traversal over a `Ranking`, with optional adjacent-duplicate suppression.

use crate::error::{RankedError, Result};
use crate::node::NodeRef;
use crate::rank::Rank;
use crate::ranking::Ranking;

/// An iterator over `(value, rank)` pairs pulled lazily from a [`Ranking`].
///
/// State machine: `AtNode(n) -> Emit(n.value, n.rank) -> AtNode(n.tail.force())`,
/// terminating at `None`. With deduplication on, `Emit` is skipped (without
/// advancing the last-emitted marker) when `n.value == last_emitted`.
pub struct RankingIter<T> {
    current: Option<NodeRef<T>>,
    last_emitted: Option<T>,
    last_rank: Option<Rank>,
    dedup: bool,
}

impl<T> Ranking<T> {
    /// Returns a pull iterator over this ranking's `(value, rank)` pairs.
    #[must_use]
    pub fn iter(&self) -> RankingIter<T> {
        RankingIter {
            current: self.head.clone(),
            last_emitted: None,
            last_rank: None,
            dedup: self.dedup,
        }
    }
}

impl<T> IntoIterator for Ranking<T>
where
    T: Clone + PartialEq,
{
    type Item = Result<(T, Rank)>;
    type IntoIter = RankingIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        RankingIter {
            current: self.head,
            last_emitted: None,
            last_rank: None,
            dedup: self.dedup,
        }
    }
}

impl<T> Iterator for RankingIter<T>
where
    T: Clone + PartialEq,
{
    type Item = Result<(T, Rank)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.current.take()?;

            let value = match node.value.force() {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            let rank = node.rank;

            if let Some(previous) = self.last_rank {
                if previous > rank {
                    return Some(Err(RankedError::RankOrderViolation {
                        previous,
                        next: rank,
                    }));
                }
            }
            self.last_rank = Some(rank);

            match node.tail.force() {
                Ok(tail) => self.current = tail,
                Err(e) => return Some(Err(e)),
            }

            if self.dedup {
                if let Some(prev) = &self.last_emitted {
                    if *prev == value {
                        continue;
                    }
                }
            }
            self.last_emitted = Some(value.clone());
            return Some(Ok((value, rank)));
        }
    }
}
