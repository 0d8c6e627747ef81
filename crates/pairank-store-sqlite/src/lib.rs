//! SQLite backend for the pairank ranking engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write, including rank
//! materialisation, is serialised on that thread.

mod encode;
mod refresher;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{RankPolicy, SqliteStore};
