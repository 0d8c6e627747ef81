//! SQL schema for the pairank SQLite store.
//!
//! Executed once at connection startup. The `items` and `comparisons` tables
//! match the persisted layout exactly; the extra index carries the unordered
//! pair rule down to the database.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS items (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    rank INTEGER NULL              -- written only by rank materialisation
);

-- Comparisons are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS comparisons (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    item1_id  INTEGER NOT NULL REFERENCES items(id),
    item2_id  INTEGER NOT NULL REFERENCES items(id),
    score     INTEGER NOT NULL,    -- item1's perspective; > 0 means item1 preferred
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (item1_id, item2_id)
);

-- (a, b) and (b, a) are the same pair.
CREATE UNIQUE INDEX IF NOT EXISTS comparisons_pair_idx
    ON comparisons(min(item1_id, item2_id), max(item1_id, item2_id));

CREATE INDEX IF NOT EXISTS comparisons_item2_idx ON comparisons(item2_id);

PRAGMA user_version = 1;
";
