//! Item: a named entity placed in the ranking.
//!
//! The `rank` attribute is derived state. It is written only by the ranking
//! engine's materialisation path and is never accepted from callers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub id:   i64,
  pub name: String,
  /// `None` until the item takes part in at least one comparison.
  pub rank: Option<i64>,
}

/// Sort order for [`crate::store::RankingStore::list_items`].
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemOrder {
  /// Ranked items first by ascending rank, then unranked items; ties by id.
  #[default]
  Rank,
  /// By name, ties by id.
  Name,
}

impl ItemOrder {
  /// Sort `items` in place according to this order.
  pub fn sort(self, items: &mut [Item]) {
    match self {
      Self::Rank => items.sort_by(|a, b| {
        // `None` sorts after every `Some`.
        (a.rank.is_none(), a.rank, a.id).cmp(&(b.rank.is_none(), b.rank, b.id))
      }),
      Self::Name => items.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id))),
    }
  }
}

/// Trim `name` and reject it if nothing is left.
pub fn normalize_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyName);
  }
  Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn item(id: i64, name: &str, rank: Option<i64>) -> Item {
    Item { id, name: name.into(), rank }
  }

  #[test]
  fn rank_order_puts_unranked_last() {
    let mut items = vec![
      item(1, "a", None),
      item(2, "b", Some(2)),
      item(3, "c", Some(1)),
      item(4, "d", None),
      item(5, "e", Some(2)),
    ];
    ItemOrder::Rank.sort(&mut items);
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, [3, 2, 5, 1, 4]);
  }

  #[test]
  fn name_order_breaks_ties_by_id() {
    let mut items = vec![item(3, "pear", None), item(1, "apple", Some(1)), item(2, "pear", None)];
    ItemOrder::Name.sort(&mut items);
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, [1, 2, 3]);
  }

  #[test]
  fn order_parses_from_lowercase() {
    assert_eq!(ItemOrder::from_str("rank").unwrap(), ItemOrder::Rank);
    assert_eq!(ItemOrder::from_str("name").unwrap(), ItemOrder::Name);
    assert!(ItemOrder::from_str("score").is_err());
    assert_eq!(ItemOrder::Name.to_string(), "name");
  }

  #[test]
  fn names_are_trimmed() {
    assert_eq!(normalize_name("  tea ").unwrap(), "tea");
    assert!(matches!(normalize_name(""), Err(Error::EmptyName)));
    assert!(matches!(normalize_name(" \t\n"), Err(Error::EmptyName)));
  }
}
