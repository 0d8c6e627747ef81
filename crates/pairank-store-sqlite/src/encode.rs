//! Conversions between SQLite rows and domain types.
//!
//! Timestamps are written by the column default (`CURRENT_TIMESTAMP`), which
//! SQLite renders as UTC text in `YYYY-MM-DD HH:MM:SS` form.

use chrono::{DateTime, NaiveDateTime, Utc};
use pairank_core::{comparison::Comparison, item::Item};
use rusqlite::Row;

use crate::{Error, Result};

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(s, SQLITE_DATETIME)
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`item_from_row`].
pub const ITEM_COLUMNS: &str = "id, name, rank";

pub fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
  Ok(Item { id: row.get(0)?, name: row.get(1)?, rank: row.get(2)? })
}

/// Column list matching [`RawComparison::from_row`].
pub const COMPARISON_COLUMNS: &str = "id, item1_id, item2_id, score, timestamp";

/// A `comparisons` row with the timestamp still in its stored text form.
pub struct RawComparison {
  pub id:        i64,
  pub item1_id:  i64,
  pub item2_id:  i64,
  pub score:     i64,
  pub timestamp: String,
}

impl RawComparison {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      item1_id:  row.get(1)?,
      item2_id:  row.get(2)?,
      score:     row.get(3)?,
      timestamp: row.get(4)?,
    })
  }

  pub fn into_comparison(self) -> Result<Comparison> {
    Ok(Comparison {
      id:        self.id,
      item1_id:  self.item1_id,
      item2_id:  self.item2_id,
      score:     self.score,
      timestamp: decode_timestamp(&self.timestamp)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};

  use super::*;

  #[test]
  fn decodes_sqlite_current_timestamp() {
    let ts = decode_timestamp("2024-03-09 17:04:31").unwrap();
    assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 9));
    assert_eq!((ts.hour(), ts.minute(), ts.second()), (17, 4, 31));
  }

  #[test]
  fn rejects_other_formats() {
    assert!(matches!(decode_timestamp("yesterday"), Err(Error::DateParse(_))));
  }
}
