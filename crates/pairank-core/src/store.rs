//! The `RankingStore` trait.
//!
//! Implemented by storage backends (e.g. `pairank-store-sqlite`). Higher
//! layers depend on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  comparison::{Comparison, NewComparison},
  item::{Item, ItemOrder},
};

/// Abstraction over a pairank storage backend.
///
/// The comparison log is append-only and is the source of truth. Item ranks
/// are a cache derived from it; the trait offers no way to write a rank
/// directly.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RankingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Register a new item. The name is trimmed; an empty name is rejected.
  /// The new item starts unranked.
  fn create_item<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + 'a;

  /// Fetch an item by id; fails with a not-found error if absent.
  fn get_item(&self, id: i64) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  fn list_items(
    &self,
    order: ItemOrder,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  /// Delete an item that no comparison references.
  fn remove_item(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Comparison log ────────────────────────────────────────────────────

  /// Append a comparison. At most one comparison may exist per unordered
  /// pair of items. The timestamp is assigned by the store.
  fn record_comparison(
    &self,
    input: NewComparison,
  ) -> impl Future<Output = Result<Comparison, Self::Error>> + Send + '_;

  /// All comparisons in insertion order, optionally restricted to those
  /// touching `item_id`.
  fn list_comparisons(
    &self,
    item_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Comparison>, Self::Error>> + Send + '_;

  /// A random pair of items that has not been compared yet, or `None` if no
  /// such pair exists.
  fn suggest_pair(
    &self,
  ) -> impl Future<Output = Result<Option<(Item, Item)>, Self::Error>> + Send + '_;

  // ── Ranking ───────────────────────────────────────────────────────────

  /// Recompute every rank from the full comparison log and materialise the
  /// result atomically. Idempotent.
  fn recompute_ranks(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Check materialised ranks against a fresh recompute. On divergence the
  /// ranks are repaired and a consistency error is returned.
  fn verify_ranks(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
