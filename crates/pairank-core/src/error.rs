//! Error types for `pairank-core`.

use thiserror::Error;

/// The caller-facing class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Malformed input: empty name, self-comparison, removing a referenced
  /// item.
  Validation,
  /// An item id that does not exist.
  NotFound,
  /// The unordered pair has already been compared.
  DuplicateComparison,
  /// Materialised ranks diverged from a fresh recompute.
  Consistency,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("item name must not be empty")]
  EmptyName,

  #[error("item {0} cannot be compared with itself")]
  SelfComparison(i64),

  #[error("item {0} is referenced by at least one comparison")]
  ItemInUse(i64),

  #[error("item not found: {0}")]
  ItemNotFound(i64),

  #[error("items {low} and {high} have already been compared")]
  DuplicateComparison { low: i64, high: i64 },

  #[error("materialised ranks diverged for {diverged} item(s); ranks were recomputed")]
  Consistency { diverged: usize },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::EmptyName | Self::SelfComparison(_) | Self::ItemInUse(_) => {
        ErrorKind::Validation
      }
      Self::ItemNotFound(_) => ErrorKind::NotFound,
      Self::DuplicateComparison { .. } => ErrorKind::DuplicateComparison,
      Self::Consistency { .. } => ErrorKind::Consistency,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
