//! The ranking engine: net-score aggregation over the comparison graph.
//!
//! Each comparison is a directed weighted edge. An item's net score is the
//! sum of `score` over comparisons where it is `item1`, minus the sum over
//! comparisons where it is `item2`. Items are ranked by descending net score
//! using standard competition ranking ("1224"): equal nets share a rank and
//! the next distinct net skips by the size of the tie group.
//!
//! Aggregation never requires acyclicity, so cycles (A beats B, B beats C,
//! C beats A) rank without special handling. Items that appear in no
//! comparison have no rank.
//!
//! [`NetScores::apply`] is the incremental path; it touches exactly two
//! entries. Because addition is commutative, applying any sequence of
//! comparisons one at a time yields the same [`RankTable`] as rebuilding from
//! the full log with [`NetScores::from_outcomes`].

use std::collections::BTreeMap;

use crate::comparison::Comparison;

// ─── Net scores ──────────────────────────────────────────────────────────────

/// Per-item net score accumulator, keyed by item id.
///
/// Only items that took part in at least one comparison have an entry.
/// Values are `i128` so that summing any number of `i64` scores cannot
/// overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetScores {
  nets: BTreeMap<i64, i128>,
}

impl NetScores {
  pub fn new() -> Self { Self::default() }

  /// Full rebuild from `(item1_id, item2_id, score)` triples.
  pub fn from_outcomes<I>(outcomes: I) -> Self
  where
    I: IntoIterator<Item = (i64, i64, i64)>,
  {
    let mut nets = Self::new();
    for (item1_id, item2_id, score) in outcomes {
      nets.apply(item1_id, item2_id, score);
    }
    nets
  }

  pub fn from_comparisons<'a, I>(comparisons: I) -> Self
  where
    I: IntoIterator<Item = &'a Comparison>,
  {
    Self::from_outcomes(comparisons.into_iter().map(|c| (c.item1_id, c.item2_id, c.score)))
  }

  /// Fold one comparison into the accumulator.
  pub fn apply(&mut self, item1_id: i64, item2_id: i64, score: i64) {
    *self.nets.entry(item1_id).or_default() += i128::from(score);
    *self.nets.entry(item2_id).or_default() -= i128::from(score);
  }

  pub fn apply_comparison(&mut self, comparison: &Comparison) {
    self.apply(comparison.item1_id, comparison.item2_id, comparison.score);
  }

  pub fn net(&self, item_id: i64) -> Option<i128> { self.nets.get(&item_id).copied() }

  pub fn len(&self) -> usize { self.nets.len() }

  pub fn is_empty(&self) -> bool { self.nets.is_empty() }

  /// Derive competition ranks from the current net scores.
  pub fn ranks(&self) -> RankTable {
    let mut ordered: Vec<(i64, i128)> = self.nets.iter().map(|(id, net)| (*id, *net)).collect();
    ordered.sort_by(|(a_id, a_net), (b_id, b_net)| b_net.cmp(a_net).then(a_id.cmp(b_id)));

    let mut ranks = BTreeMap::new();
    let mut current: Option<(i128, i64)> = None;
    for (position, (id, net)) in ordered.into_iter().enumerate() {
      let rank = match current {
        Some((prev_net, prev_rank)) if prev_net == net => prev_rank,
        _ => position as i64 + 1,
      };
      current = Some((net, rank));
      ranks.insert(id, rank);
    }
    RankTable { ranks }
  }
}

// ─── Rank table ──────────────────────────────────────────────────────────────

/// The engine's output: item id → rank, for ranked items only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
  ranks: BTreeMap<i64, i64>,
}

impl RankTable {
  /// Rank of `item_id`, or `None` if it has no comparisons.
  pub fn get(&self, item_id: i64) -> Option<i64> { self.ranks.get(&item_id).copied() }

  pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
    self.ranks.iter().map(|(id, rank)| (*id, *rank))
  }

  pub fn len(&self) -> usize { self.ranks.len() }

  pub fn is_empty(&self) -> bool { self.ranks.is_empty() }

  /// Compare this table against materialised `(item_id, rank)` values and
  /// report every item whose stored rank differs.
  pub fn drift<I>(&self, materialized: I) -> Vec<RankDrift>
  where
    I: IntoIterator<Item = (i64, Option<i64>)>,
  {
    materialized
      .into_iter()
      .filter_map(|(item_id, stored)| {
        let expected = self.get(item_id);
        (stored != expected).then_some(RankDrift { item_id, stored, expected })
      })
      .collect()
  }
}

/// One item whose materialised rank disagrees with a fresh recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankDrift {
  pub item_id:  i64,
  pub stored:   Option<i64>,
  pub expected: Option<i64>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
