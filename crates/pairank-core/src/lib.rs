//! Core types and trait definitions for the pairank ranking engine.
//!
//! This crate is free of database and runtime dependencies. The ranking
//! algorithm in [`ranking`] is a pure function of the comparison log; storage
//! backends implement [`store::RankingStore`] and materialise its output.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod comparison;
pub mod error;
pub mod item;
pub mod ranking;
pub mod store;

pub use error::{Error, ErrorKind, Result};
