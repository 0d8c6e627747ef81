//! `pairank`: administration tool for a pairank store.
//!
//! Reads `pairank.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one maintenance command. Comparisons are recorded by client
//! applications through the store API; this tool only inspects and repairs.
//!
//! # Usage
//!
//! ```text
//! pairank init-db
//! pairank add-item "Flat white"
//! pairank items --order rank
//! pairank comparisons --item 3 --json
//! pairank verify
//! ```

mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pairank_core::{
  ErrorKind,
  comparison::Comparison,
  item::{Item, ItemOrder},
  store::RankingStore,
};
use pairank_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pairank", version, about = "Pairwise-comparison ranking store admin")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pairank.toml")]
  config: PathBuf,

  /// Override the configured database path.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the schema if it does not exist.
  InitDb,
  /// Register a new item.
  AddItem { name: String },
  /// Delete an item that no comparison references.
  RemoveItem { id: i64 },
  /// List items.
  Items {
    /// `rank` or `name`.
    #[arg(long)]
    order: Option<ItemOrder>,
  },
  /// List the comparison log in insertion order.
  Comparisons {
    /// Only comparisons touching this item.
    #[arg(long)]
    item: Option<i64>,
  },
  /// Suggest a pair of items that has not been compared yet.
  Suggest,
  /// Recompute every rank from the comparison log.
  Recompute,
  /// Check materialised ranks against the log, repairing them on drift.
  Verify,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;
  let store_path = cli.store.clone().unwrap_or(cfg.store_path.clone());

  let store = SqliteStore::open_with_policy(&store_path, cfg.rank_policy())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::InitDb => {
      tracing::info!("initialised database {store_path:?}");
    }
    Command::AddItem { name } => {
      let item = store.create_item(&name).await?;
      print_items(std::slice::from_ref(&item), cli.json)?;
    }
    Command::RemoveItem { id } => {
      store.remove_item(id).await?;
      tracing::info!(id, "item removed");
    }
    Command::Items { order } => {
      let items = store.list_items(order.unwrap_or(cfg.default_order)).await?;
      print_items(&items, cli.json)?;
    }
    Command::Comparisons { item } => {
      let comparisons = store.list_comparisons(item).await?;
      print_comparisons(&comparisons, cli.json)?;
    }
    Command::Suggest => match store.suggest_pair().await? {
      Some((a, b)) => print_items(&[a, b], cli.json)?,
      None => tracing::info!("every pair of items has been compared"),
    },
    Command::Recompute => {
      store.recompute_ranks().await?;
    }
    Command::Verify => match store.verify_ranks().await {
      Ok(()) => tracing::info!("ranks are consistent with the comparison log"),
      Err(e) if e.kind() == Some(ErrorKind::Consistency) => {
        tracing::warn!("{e}");
        std::process::exit(2);
      }
      Err(e) => return Err(e.into()),
    },
  }

  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_items(items: &[Item], json: bool) -> anyhow::Result<()> {
  if json {
    return print_json(items);
  }
  for item in items {
    let rank = item.rank.map_or_else(|| "-".to_owned(), |r| r.to_string());
    println!("{:>6}  {:>5}  {}", item.id, rank, item.name);
  }
  Ok(())
}

fn print_comparisons(comparisons: &[Comparison], json: bool) -> anyhow::Result<()> {
  if json {
    return print_json(comparisons);
  }
  for c in comparisons {
    println!(
      "{:>6}  {}  {:>6} vs {:<6} {:>+5}",
      c.id,
      c.timestamp.format("%Y-%m-%d %H:%M:%S"),
      c.item1_id,
      c.item2_id,
      c.score
    );
  }
  Ok(())
}
