//! Layered configuration: optional TOML file, then `PAIRANK_*` environment
//! variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{ConfigBuilder, builder::DefaultState};
use pairank_core::item::ItemOrder;
use pairank_store_sqlite::RankPolicy;
use serde::Deserialize;

/// Which [`RankPolicy`] the store is opened with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
  #[default]
  Synchronous,
  Debounced,
}

/// Runtime configuration, deserialised from `pairank.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  #[serde(default)]
  pub rank_policy:   PolicyName,
  /// Quiet period before a debounced recompute, in milliseconds.
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms:   u64,
  /// Order used by `pairank items` when `--order` is not given.
  #[serde(default)]
  pub default_order: ItemOrder,
}

fn default_store_path() -> PathBuf { PathBuf::from("items.db") }

fn default_debounce_ms() -> u64 { 500 }

impl AppConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("PAIRANK").try_parsing(true)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let settings = builder.build().context("failed to read config file")?;

    let mut cfg: AppConfig = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn rank_policy(&self) -> RankPolicy {
    match self.rank_policy {
      PolicyName::Synchronous => RankPolicy::Synchronous,
      PolicyName::Debounced => {
        RankPolicy::Debounced { delay: Duration::from_millis(self.debounce_ms) }
      }
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
