//! Database Migrations
//!
//! Schema migration definitions for the storage layer. The same schema backs
//! both the client-local log and the authoritative log; only how rows get
//! their `acknowledged` flag differs between the two deployments.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: review log, histograms, word list, sequence counter",
    up: MIGRATION_V1_UP,
}];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
-- One row per vocabulary item, mutated in place on each answer.
-- Timestamps are unix seconds; due_at = reviewed_at + interval_hours * 3600.
CREATE TABLE IF NOT EXISTS review (
    word TEXT PRIMARY KEY,
    learned_at INTEGER NOT NULL,
    reviewed_at INTEGER NOT NULL,
    interval_hours INTEGER NOT NULL DEFAULT 0,
    due_at INTEGER NOT NULL,
    correct INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    sequence_number INTEGER NOT NULL,
    -- 0 until the owning log's entry has been seen by the authoritative log.
    -- Always 1 on the authoritative side.
    acknowledged INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_review_due ON review(due_at);
CREATE INDEX IF NOT EXISTS idx_review_sequence ON review(sequence_number);
CREATE INDEX IF NOT EXISTS idx_review_acknowledged ON review(acknowledged);

-- Interval ladder statistics. Rows are inserted/deleted by the auto-tuner;
-- the ladder is seeded at first open.
CREATE TABLE IF NOT EXISTS interval_stats (
    interval_hours INTEGER PRIMARY KEY,
    correct INTEGER NOT NULL DEFAULT 0,
    incorrect INTEGER NOT NULL DEFAULT 0
);

-- Per-frequency-class accuracy, one row per tier the learner was tested at.
CREATE TABLE IF NOT EXISTS difficulty_stats (
    frequency_class INTEGER PRIMARY KEY,
    correct INTEGER NOT NULL DEFAULT 0,
    incorrect INTEGER NOT NULL DEFAULT 0
);

-- Word-frequency reference table. Static apart from the seen flag.
CREATE TABLE IF NOT EXISTS word (
    word TEXT PRIMARY KEY,
    frequency_class INTEGER NOT NULL,
    seen INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_word_class ON word(frequency_class);
CREATE INDEX IF NOT EXISTS idx_word_seen ON word(seen, frequency_class);

-- Monotonically increasing per-log counters.
CREATE TABLE IF NOT EXISTS meta (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);

INSERT OR IGNORE INTO meta (name, value) VALUES ('sequence_counter', 0);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
