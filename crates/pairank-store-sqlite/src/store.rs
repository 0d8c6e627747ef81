//! [`SqliteStore`], the SQLite implementation of [`RankingStore`].

use std::{path::Path, sync::Arc, time::Duration};

use parking_lot::Mutex;
use rusqlite::{OptionalExtension as _, Transaction, TransactionBehavior};

use pairank_core::{
  comparison::{Comparison, NewComparison, PairKey},
  item::{Item, ItemOrder, normalize_name},
  ranking::{NetScores, RankTable},
  store::RankingStore,
};

use crate::{
  Error, Result,
  encode::{COMPARISON_COLUMNS, ITEM_COLUMNS, RawComparison, item_from_row},
  refresher::RankRefresher,
  schema::SCHEMA,
};

// ─── Rank policy ─────────────────────────────────────────────────────────────

/// When materialised ranks are brought up to date with the comparison log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankPolicy {
  /// Every recorded comparison updates ranks in the same transaction as the
  /// insert. Ranks are never behind the log.
  #[default]
  Synchronous,
  /// Recording only appends. A background task recomputes ranks once no
  /// comparison has been recorded for `delay`; until then ranks may lag the
  /// log. Call [`RankingStore::recompute_ranks`] for up-to-date ranks.
  Debounced { delay: Duration },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pairank store backed by a single SQLite file.
///
/// Cloning is cheap. The connection, net-score cache and background
/// refresher are all shared.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  policy: RankPolicy,
  /// Only mutated on the connection thread, after the owning transaction
  /// commits.
  cache: Arc<Mutex<RankCache>>,
  refresher: Option<Arc<RankRefresher>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with [`RankPolicy::Synchronous`].
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_policy(path, RankPolicy::default()).await
  }

  pub async fn open_with_policy(path: impl AsRef<Path>, policy: RankPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, policy).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_policy(RankPolicy::default()).await
  }

  pub async fn open_in_memory_with_policy(policy: RankPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, policy).await
  }

  async fn init(conn: tokio_rusqlite::Connection, policy: RankPolicy) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let cache = Arc::new(Mutex::new(RankCache::default()));
    let refresher = match policy {
      RankPolicy::Synchronous => None,
      RankPolicy::Debounced { delay } => {
        Some(Arc::new(RankRefresher::spawn(conn.clone(), cache.clone(), delay)))
      }
    };

    let store = Self { conn, policy, cache, refresher };
    // Seeds the net-score cache and repairs ranks left stale by a previous
    // process.
    store.recompute_ranks().await?;
    Ok(store)
  }

  pub fn policy(&self) -> RankPolicy { self.policy }
}

// ─── Rank cache ──────────────────────────────────────────────────────────────

/// Identifies a state of the append-only comparison log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LogPosition {
  count:  i64,
  max_id: i64,
}

fn log_position(conn: &rusqlite::Connection) -> rusqlite::Result<LogPosition> {
  conn.query_row(
    "SELECT count(*), coalesce(max(id), 0) FROM comparisons",
    [],
    |row| Ok(LogPosition { count: row.get(0)?, max_id: row.get(1)? }),
  )
}

/// Net scores matching the materialised ranks, tagged with the log position
/// they were built from. Other connections may append to the same file, so
/// the position is checked before the scores are updated incrementally.
#[derive(Debug, Clone, Default)]
pub(crate) struct RankCache {
  nets: NetScores,
  log:  LogPosition,
}

// ─── Rank materialisation ────────────────────────────────────────────────────

/// Write `ranks` into `items.rank`, touching only rows whose value changes.
///
/// This is the only code path that writes the `rank` column.
fn write_ranks(tx: &Transaction<'_>, ranks: &RankTable) -> rusqlite::Result<usize> {
  let stored = load_stored_ranks(tx)?;
  let drift = ranks.drift(stored);

  let mut update = tx.prepare_cached("UPDATE items SET rank = ?2 WHERE id = ?1")?;
  for d in &drift {
    update.execute(rusqlite::params![d.item_id, d.expected])?;
  }
  Ok(drift.len())
}

fn load_stored_ranks(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<(i64, Option<i64>)>> {
  let mut stmt = conn.prepare_cached("SELECT id, rank FROM items")?;
  let rows = stmt
    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn load_net_scores(conn: &rusqlite::Connection) -> rusqlite::Result<NetScores> {
  let mut stmt =
    conn.prepare_cached("SELECT item1_id, item2_id, score FROM comparisons ORDER BY id")?;
  let outcomes = stmt
    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
    .collect::<rusqlite::Result<Vec<(i64, i64, i64)>>>()?;
  Ok(NetScores::from_outcomes(outcomes))
}

/// Recompute every rank from the full log in one transaction, then replace
/// the net-score cache. Returns the number of rank values that changed.
pub(crate) fn materialize_full(
  conn: &mut rusqlite::Connection,
  cache: &Mutex<RankCache>,
) -> rusqlite::Result<usize> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let nets = load_net_scores(&tx)?;
  let log = log_position(&tx)?;
  let changed = write_ranks(&tx, &nets.ranks())?;
  tx.commit()?;
  *cache.lock() = RankCache { nets, log };
  Ok(changed)
}

// ─── Comparison insert ───────────────────────────────────────────────────────

fn item_exists(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM items WHERE id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn pair_exists(conn: &rusqlite::Connection, pair: PairKey) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM comparisons
         WHERE min(item1_id, item2_id) = ?1 AND max(item1_id, item2_id) = ?2",
        [pair.low, pair.high],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Validate and append one comparison, all inside a single IMMEDIATE
/// transaction. With a cache, ranks are updated before commit: incrementally
/// when the cache is at the log's current position, otherwise by rebuilding
/// from the log inside the same transaction.
///
/// The pair index is the final arbiter of uniqueness. A violation it raises
/// during the insert is retried once before surfacing as a duplicate.
fn insert_comparison(
  conn: &mut rusqlite::Connection,
  input: NewComparison,
  pair: PairKey,
  cache: Option<&Mutex<RankCache>>,
) -> Result<Comparison> {
  let sql = format!(
    "INSERT INTO comparisons (item1_id, item2_id, score) VALUES (?1, ?2, ?3)
     RETURNING {COMPARISON_COLUMNS}"
  );

  for attempt in 0..2 {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    for id in [input.item1_id, input.item2_id] {
      if !item_exists(&tx, id)? {
        return Err(pairank_core::Error::ItemNotFound(id).into());
      }
    }
    if pair_exists(&tx, pair)? {
      return Err(pair.duplicate_error().into());
    }
    let before = log_position(&tx)?;

    let inserted = tx.query_row(
      &sql,
      rusqlite::params![input.item1_id, input.item2_id, input.score],
      RawComparison::from_row,
    );
    let raw = match inserted {
      Ok(raw) => raw,
      Err(e) if is_unique_violation(&e) && attempt == 0 => {
        tracing::warn!(low = pair.low, high = pair.high, "pair insert raced; retrying");
        continue;
      }
      Err(e) if is_unique_violation(&e) => return Err(pair.duplicate_error().into()),
      Err(e) => return Err(e.into()),
    };
    let comparison = raw.into_comparison()?;

    match cache {
      Some(cache) => {
        let mut next = cache.lock().clone();
        if next.log == before {
          next.nets.apply_comparison(&comparison);
        } else {
          tracing::debug!(
            cached = next.log.count,
            actual = before.count,
            "rank cache behind comparison log; rebuilding"
          );
          next.nets = load_net_scores(&tx)?;
        }
        next.log = LogPosition { count: before.count + 1, max_id: comparison.id };
        write_ranks(&tx, &next.nets.ranks())?;
        tx.commit()?;
        *cache.lock() = next;
      }
      None => tx.commit()?,
    }
    return Ok(comparison);
  }

  Err(pair.duplicate_error().into())
}

// ─── RankingStore impl ───────────────────────────────────────────────────────

impl RankingStore for SqliteStore {
  type Error = Error;

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn create_item(&self, name: &str) -> Result<Item> {
    let name = normalize_name(name)?;
    let insert_name = name.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO items (name) VALUES (?1) RETURNING id",
          [insert_name],
          |row| row.get(0),
        )?)
      })
      .await?;

    tracing::debug!(id, name = %name, "created item");
    Ok(Item { id, name, rank: None })
  }

  async fn get_item(&self, id: i64) -> Result<Item> {
    let item: Option<Item> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
              [id],
              item_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    item.ok_or_else(|| pairank_core::Error::ItemNotFound(id).into())
  }

  async fn list_items(&self, order: ItemOrder) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items"))?;
        let rows = stmt
          .query_map([], item_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    order.sort(&mut items);
    Ok(items)
  }

  async fn remove_item(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !item_exists(&tx, id)? {
          return Ok(Err(pairank_core::Error::ItemNotFound(id)));
        }
        let referenced = tx
          .query_row(
            "SELECT 1 FROM comparisons WHERE item1_id = ?1 OR item2_id = ?1 LIMIT 1",
            [id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if referenced {
          return Ok(Err(pairank_core::Error::ItemInUse(id)));
        }
        tx.execute("DELETE FROM items WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(id, "removed item");
    Ok(())
  }

  // ── Comparison log ────────────────────────────────────────────────────────

  async fn record_comparison(&self, input: NewComparison) -> Result<Comparison> {
    let pair = input.pair()?;
    let cache = match self.policy {
      RankPolicy::Synchronous => Some(self.cache.clone()),
      RankPolicy::Debounced { .. } => None,
    };

    let comparison = self
      .conn
      .call(move |conn| Ok(insert_comparison(conn, input, pair, cache.as_deref())))
      .await??;

    tracing::debug!(
      id = comparison.id,
      item1_id = comparison.item1_id,
      item2_id = comparison.item2_id,
      score = comparison.score,
      "recorded comparison"
    );

    if let Some(refresher) = &self.refresher {
      refresher.schedule();
    }
    Ok(comparison)
  }

  async fn list_comparisons(&self, item_id: Option<i64>) -> Result<Vec<Comparison>> {
    if let Some(id) = item_id {
      // Surfaces a not-found error for unknown ids.
      self.get_item(id).await?;
    }

    let raws: Vec<RawComparison> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(id) = item_id {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM comparisons
             WHERE item1_id = ?1 OR item2_id = ?1
             ORDER BY id"
          ))?;
          stmt
            .query_map([id], RawComparison::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM comparisons ORDER BY id"
          ))?;
          stmt
            .query_map([], RawComparison::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComparison::into_comparison).collect()
  }

  async fn suggest_pair(&self) -> Result<Option<(Item, Item)>> {
    self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT a.id, a.name, a.rank, b.id, b.name, b.rank, (random() & 1) AS swap
               FROM items a
               JOIN items b ON a.id < b.id
               WHERE NOT EXISTS (
                 SELECT 1 FROM comparisons c
                 WHERE min(c.item1_id, c.item2_id) = a.id
                   AND max(c.item1_id, c.item2_id) = b.id
               )
               ORDER BY random()
               LIMIT 1",
              [],
              |row| {
                let a = Item { id: row.get(0)?, name: row.get(1)?, rank: row.get(2)? };
                let b = Item { id: row.get(3)?, name: row.get(4)?, rank: row.get(5)? };
                // Random presentation order, so neither side is favoured by
                // position.
                let swap: i64 = row.get(6)?;
                Ok(if swap == 0 { (a, b) } else { (b, a) })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)
  }

  // ── Ranking ───────────────────────────────────────────────────────────────

  async fn recompute_ranks(&self) -> Result<()> {
    let cache = self.cache.clone();
    let changed = self
      .conn
      .call(move |conn| Ok(materialize_full(conn, &cache)?))
      .await?;

    tracing::info!(changed, "recomputed ranks");
    Ok(())
  }

  async fn verify_ranks(&self) -> Result<()> {
    let drift = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let nets = load_net_scores(&tx)?;
        let stored = load_stored_ranks(&tx)?;
        Ok(nets.ranks().drift(stored))
      })
      .await?;

    if drift.is_empty() {
      return Ok(());
    }

    for d in &drift {
      tracing::warn!(
        item_id = d.item_id,
        stored = ?d.stored,
        expected = ?d.expected,
        "materialised rank diverges from log"
      );
    }
    self.recompute_ranks().await?;
    Err(pairank_core::Error::Consistency { diverged: drift.len() }.into())
  }
}
