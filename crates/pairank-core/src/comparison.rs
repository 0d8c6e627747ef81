//! Comparisons: immutable pairwise outcomes in the append-only log.
//!
//! # Score convention
//!
//! `score` is read from `item1`'s perspective:
//!
//! - `score > 0`: `item1` is preferred, `score` is the strength.
//! - `score < 0`: `item2` is preferred, `-score` is the strength.
//! - `score == 0`: a draw. The pair is consumed and both items become ranked,
//!   but neither net score moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A persisted comparison. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
  pub id:        i64,
  pub item1_id:  i64,
  pub item2_id:  i64,
  pub score:     i64,
  /// Server-assigned; never accepted from callers.
  pub timestamp: DateTime<Utc>,
}

impl Comparison {
  pub fn pair(&self) -> PairKey {
    PairKey { low: self.item1_id.min(self.item2_id), high: self.item1_id.max(self.item2_id) }
  }

  pub fn involves(&self, item_id: i64) -> bool {
    self.item1_id == item_id || self.item2_id == item_id
  }
}

/// Input to [`crate::store::RankingStore::record_comparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComparison {
  pub item1_id: i64,
  pub item2_id: i64,
  pub score:    i64,
}

impl NewComparison {
  pub fn new(item1_id: i64, item2_id: i64, score: i64) -> Self {
    Self { item1_id, item2_id, score }
  }

  /// Canonical unordered pair for this comparison; rejects self-comparison.
  pub fn pair(&self) -> Result<PairKey> { PairKey::new(self.item1_id, self.item2_id) }
}

/// An unordered pair of distinct item ids in canonical order (`low < high`).
///
/// `(a, b)` and `(b, a)` produce the same key, which is what the comparison
/// log's uniqueness rule is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
  pub low:  i64,
  pub high: i64,
}

impl PairKey {
  pub fn new(a: i64, b: i64) -> Result<Self> {
    if a == b {
      return Err(Error::SelfComparison(a));
    }
    Ok(Self { low: a.min(b), high: a.max(b) })
  }

  pub fn duplicate_error(self) -> Error {
    Error::DuplicateComparison { low: self.low, high: self.high }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pair_key_ignores_argument_order() {
    assert_eq!(PairKey::new(7, 3).unwrap(), PairKey::new(3, 7).unwrap());
    assert_eq!(PairKey::new(7, 3).unwrap(), PairKey { low: 3, high: 7 });
  }

  #[test]
  fn pair_key_rejects_self_comparison() {
    let err = NewComparison::new(4, 4, 1).pair().unwrap_err();
    assert!(matches!(err, Error::SelfComparison(4)));
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
  }

  #[test]
  fn persisted_comparison_pair_matches_input_pair() {
    let c = Comparison { id: 1, item1_id: 9, item2_id: 2, score: -3, timestamp: Utc::now() };
    assert_eq!(c.pair(), NewComparison::new(2, 9, 3).pair().unwrap());
    assert!(c.involves(9) && c.involves(2) && !c.involves(3));
  }
}
