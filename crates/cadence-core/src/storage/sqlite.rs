//! SQLite Storage Implementation
//!
//! One review log, two histogram tables, a word-frequency reference table,
//! and a sequence counter - the persisted state behind the scheduling core.
//! The client-local and authoritative logs are two instances of this same
//! store; the sync module is what tells them apart.
//!
//! Every answered item is one transaction: the review upsert, the histogram
//! counter increment, and any bucket insert/delete performed by the
//! auto-tuner commit together or not at all. Reads go through a separate
//! connection so a dashboard querying histograms mid-save observes either
//! the pre- or post-transaction state, never an intermediate one.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};

use crate::srs::{
    self, BucketCounts, DifficultyHistogram, IntervalHistogram, Review, ReviewOutcome, WordEntry,
};

/// Frequency class new learners start at when the word table gives no
/// better answer.
const DEFAULT_START_CLASS: i64 = 1;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Invalid input, surfaced to the caller and never retried internally
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Sync transport failure
    #[error("Sync transport error: {0}")]
    Transport(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome counts of a best-effort bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkImportReport {
    /// Items whose review save committed.
    pub succeeded: usize,
    /// Items whose review save was rolled back.
    pub failed: usize,
}

/// Callback fired after each committed answer. Injected at construction;
/// explicit message passing instead of a process-wide event bus.
pub type ReviewListener = Box<dyn Fn(&Review) + Send + Sync>;

// ============================================================================
// STORE
// ============================================================================

/// Per-account durable store for one review log.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self` (not `&mut self`), making the store `Send + Sync`.
/// Review submissions are expected to be serialized by the caller; reads may
/// run concurrently with a save.
pub struct Store {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    listener: Option<ReviewListener>,
}

impl Store {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (creating if necessary) the store at `db_path`, or at the
    /// platform-specific default location when no path is given.
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        Self::open_inner(db_path, None)
    }

    /// Same as [`Store::open`], with a listener that fires after each
    /// committed [`Store::submit_answer`].
    pub fn open_with_listener(db_path: Option<PathBuf>, listener: ReviewListener) -> Result<Self> {
        Self::open_inner(db_path, Some(listener))
    }

    fn open_inner(db_path: Option<PathBuf>, listener: Option<ReviewListener>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "cadence", "core").ok_or_else(|| {
                    StoreError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("cadence.db")
            }
        };

        let mut writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations and seed the interval ladder on the writer only
        super::migrations::apply_migrations(&writer_conn)?;
        seed_interval_ladder(&mut writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            listener,
        })
    }

    // ========================================================================
    // REVIEW SUBMISSION
    // ========================================================================

    /// Record one answer and compute the item's next review.
    ///
    /// The review upsert, histogram increment, and auto-tuner ladder change
    /// are one transaction. Fails with [`StoreError::InvalidInput`] when
    /// `now` predates the item's `learned_at`.
    pub fn submit_answer(&self, word: &str, correct: bool, now: DateTime<Utc>) -> Result<Review> {
        let review = {
            let mut writer = self.lock_writer()?;
            let tx = writer.transaction()?;
            let review = apply_answer(&tx, word, correct, now)?;
            tx.commit()?;
            review
        };

        if let Some(listener) = &self.listener {
            listener(&review);
        }
        Ok(review)
    }

    /// Same as [`Store::submit_answer`] at the current time.
    pub fn submit_answer_now(&self, word: &str, correct: bool) -> Result<Review> {
        self.submit_answer(word, correct, Utc::now())
    }

    /// Save answers in bulk, best-effort.
    ///
    /// Each item runs under its own savepoint: one failed save rolls back
    /// alone and the commit of the rest is still attempted. Per-item errors
    /// are counted and logged, not surfaced.
    pub fn bulk_import(
        &self,
        outcomes: &[ReviewOutcome],
        now: DateTime<Utc>,
    ) -> Result<BulkImportReport> {
        let mut writer = self.lock_writer()?;
        let mut tx = writer.transaction()?;
        let mut report = BulkImportReport::default();

        for outcome in outcomes {
            let sp = tx.savepoint()?;
            match apply_answer(&sp, &outcome.word, outcome.correct, now) {
                Ok(_) => {
                    sp.commit()?;
                    report.succeeded += 1;
                }
                Err(err) => {
                    // Savepoint rolls back on drop.
                    tracing::warn!(word = %outcome.word, error = %err, "bulk import: item skipped");
                    report.failed += 1;
                }
            }
        }

        tx.commit()?;
        Ok(report)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Most recent review of `word`, if it was ever answered.
    pub fn review(&self, word: &str) -> Result<Option<Review>> {
        let reader = self.lock_reader()?;
        get_review(&reader, word)
    }

    /// Items due for review at `now`, soonest first, at most `limit` of them
    /// (all of them when `limit` is `None`).
    pub fn due_items(&self, now: DateTime<Utc>, limit: Option<usize>) -> Result<Vec<String>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT word FROM review WHERE due_at <= ?1 ORDER BY due_at, word LIMIT ?2",
        )?;
        let limit = limit.map_or(-1, |n| n as i64);
        let rows = stmt.query_map(params![now.timestamp(), limit], |row| row.get(0))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// The frequency class at which new words should currently be
    /// introduced.
    pub fn placement_level(&self) -> Result<i64> {
        let reader = self.lock_reader()?;
        placement_level_conn(&reader)
    }

    /// Unseen words to introduce next, biased by the placement level: words
    /// at or above the level first (easiest of them first), then the pool
    /// below it (hardest first) once the preferred pool runs out.
    pub fn new_word_candidates(&self, limit: usize) -> Result<Vec<String>> {
        let reader = self.lock_reader()?;
        let level = placement_level_conn(&reader)?;

        let mut words: Vec<String> = Vec::with_capacity(limit);
        let mut stmt = reader.prepare(
            "SELECT word FROM word WHERE seen = 0 AND frequency_class >= ?1
             ORDER BY frequency_class, word LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![level, limit as i64], |row| row.get(0))?;
        for row in rows {
            words.push(row?);
        }

        if words.len() < limit {
            let mut stmt = reader.prepare(
                "SELECT word FROM word WHERE seen = 0 AND frequency_class < ?1
                 ORDER BY frequency_class DESC, word LIMIT ?2",
            )?;
            let remaining = (limit - words.len()) as i64;
            let rows = stmt.query_map(params![level, remaining], |row| row.get(0))?;
            for row in rows {
                words.push(row?);
            }
        }
        Ok(words)
    }

    /// Populate or refresh the word-frequency reference table. Existing
    /// entries keep their `seen` flag; only the frequency class is updated.
    pub fn import_word_list(&self, entries: &[WordEntry]) -> Result<()> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO word (word, frequency_class, seen) VALUES (?1, ?2, ?3)
                 ON CONFLICT (word) DO UPDATE SET frequency_class = excluded.frequency_class",
            )?;
            for entry in entries {
                stmt.execute(params![entry.word, entry.frequency_class, entry.seen])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Read-only snapshot of the interval ladder.
    pub fn interval_snapshot(&self) -> Result<IntervalHistogram> {
        let reader = self.lock_reader()?;
        load_intervals(&reader)
    }

    /// Read-only snapshot of the per-class accuracy table.
    pub fn difficulty_snapshot(&self) -> Result<DifficultyHistogram> {
        let reader = self.lock_reader()?;
        load_difficulty(&reader)
    }

    // ========================================================================
    // LOCKS
    // ========================================================================

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))
    }

    fn lock_reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))
    }
}

// ============================================================================
// SYNC PRIMITIVES (used by the sync module)
// ============================================================================

impl Store {
    /// Highest sequence number among acknowledged reviews, 0 if none.
    pub(crate) fn latest_acknowledged(&self) -> Result<i64> {
        let reader = self.lock_reader()?;
        let latest = reader.query_row(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM review WHERE acknowledged = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(latest)
    }

    /// Unacknowledged reviews in sequence order.
    pub(crate) fn pending_reviews(&self) -> Result<Vec<Review>> {
        let reader = self.lock_reader()?;
        select_reviews(
            &reader,
            "SELECT word, learned_at, reviewed_at, interval_hours, due_at,
                    correct, streak, sequence_number
             FROM review WHERE acknowledged = 0 ORDER BY sequence_number",
            [],
        )
    }

    /// Reviews with a sequence number above `sequence_number`, in sequence
    /// order. This is the authoritative side's conflict probe.
    pub(crate) fn reviews_after(&self, sequence_number: i64) -> Result<Vec<Review>> {
        let reader = self.lock_reader()?;
        select_reviews(
            &reader,
            "SELECT word, learned_at, reviewed_at, interval_hours, due_at,
                    correct, streak, sequence_number
             FROM review WHERE sequence_number > ?1 ORDER BY sequence_number",
            params![sequence_number],
        )
    }

    /// Move every pending review into the acknowledged log unchanged.
    pub(crate) fn acknowledge_pending(&self) -> Result<usize> {
        let writer = self.lock_writer()?;
        let changed = writer.execute("UPDATE review SET acknowledged = 1 WHERE acknowledged = 0", [])?;
        Ok(changed)
    }

    /// Append uploaded reviews to the authoritative log, assigning fresh
    /// sequence numbers, and adopt the uploader's histogram snapshots. One
    /// transaction.
    pub(crate) fn accept_upload(
        &self,
        reviews: &[Review],
        intervals: &IntervalHistogram,
        difficulty: &DifficultyHistogram,
    ) -> Result<()> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        for review in reviews {
            let mut accepted = review.clone();
            accepted.sequence_number = next_sequence(&tx)?;
            upsert_review(&tx, &accepted, true)?;
        }
        replace_interval_stats(&tx, intervals)?;
        replace_difficulty_stats(&tx, difficulty)?;
        tx.commit()?;
        Ok(())
    }

    /// Apply an authoritative conflict response: discard pending reviews,
    /// replace the acknowledged entries for each returned word, advance the
    /// sequence counter to the maximum number seen, and wholesale-replace
    /// both histogram tables. One transaction, so a failure part-way leaves
    /// the pre-sync state intact.
    pub(crate) fn apply_conflict(
        &self,
        reviews: &[Review],
        intervals: &IntervalHistogram,
        difficulty: &DifficultyHistogram,
    ) -> Result<()> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;

        tx.execute("DELETE FROM review WHERE acknowledged = 0", [])?;
        let mut max_sequence = 0;
        for review in reviews {
            upsert_review(&tx, review, true)?;
            max_sequence = max_sequence.max(review.sequence_number);
        }
        tx.execute(
            "UPDATE meta SET value = ?1 WHERE name = 'sequence_counter' AND value < ?1",
            params![max_sequence],
        )?;
        replace_interval_stats(&tx, intervals)?;
        replace_difficulty_stats(&tx, difficulty)?;

        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// TRANSACTION HELPERS
// ============================================================================

/// The per-item review save: histogram counting, scheduling, tuning, and the
/// review upsert. `conn` is expected to be a transaction or savepoint; all
/// statements commit or roll back with it.
fn apply_answer(
    conn: &Connection,
    word: &str,
    correct: bool,
    now: DateTime<Utc>,
) -> Result<Review> {
    let previous = get_review(conn, word)?;
    let mut intervals = load_intervals(conn)?;
    let crammed = srs::is_crammed(previous.as_ref(), now);
    let previous_interval = previous.as_ref().map_or(0, |prev| prev.interval_hours);
    let (delta_correct, delta_incorrect) = if correct { (1, 0) } else { (0, 1) };

    // Crammed reviews are excluded from both histograms.
    if !crammed {
        if intervals.record(previous_interval, correct) {
            conn.execute(
                "UPDATE interval_stats SET correct = correct + ?1, incorrect = incorrect + ?2
                 WHERE interval_hours = ?3",
                params![delta_correct, delta_incorrect, previous_interval],
            )?;
        }
        if let Some(class) = word_class(conn, word)? {
            conn.execute(
                "INSERT INTO difficulty_stats (frequency_class, correct, incorrect)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (frequency_class) DO UPDATE SET
                     correct = correct + ?2, incorrect = incorrect + ?3",
                params![class, delta_correct, delta_incorrect],
            )?;
        }
    }
    conn.execute(
        "UPDATE word SET seen = 1 WHERE word = ?1 AND seen = 0",
        params![word],
    )?;

    let mut review = srs::next_review(word, previous.as_ref(), correct, now, &intervals)?;

    if !crammed {
        let outcome = srs::auto_tune(&mut intervals, previous_interval);
        if let Some(inserted) = outcome.inserted {
            conn.execute(
                "INSERT OR IGNORE INTO interval_stats (interval_hours, correct, incorrect)
                 VALUES (?1, 0, 0)",
                params![inserted],
            )?;
        }
        if let Some(removed) = outcome.removed {
            conn.execute(
                "DELETE FROM interval_stats WHERE interval_hours = ?1",
                params![removed],
            )?;
            tracing::debug!(
                interval = removed,
                replacement = outcome.inserted,
                "auto-tuned interval ladder"
            );
        }
    }

    // Assigned last, after all other computation.
    review.sequence_number = next_sequence(conn)?;
    upsert_review(conn, &review, false)?;
    Ok(review)
}

/// Seed the interval ladder on first open.
fn seed_interval_ladder(conn: &mut Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM interval_stats", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO interval_stats (interval_hours, correct, incorrect) VALUES (?1, ?2, ?3)",
        )?;
        for (hours, counts) in IntervalHistogram::seeded().iter() {
            stmt.execute(params![hours, counts.correct, counts.incorrect])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn next_sequence(conn: &Connection) -> Result<i64> {
    conn.execute(
        "UPDATE meta SET value = value + 1 WHERE name = 'sequence_counter'",
        [],
    )?;
    let value = conn.query_row(
        "SELECT value FROM meta WHERE name = 'sequence_counter'",
        [],
        |row| row.get(0),
    )?;
    Ok(value)
}

fn word_class(conn: &Connection, word: &str) -> Result<Option<i64>> {
    let class = conn
        .query_row(
            "SELECT frequency_class FROM word WHERE word = ?1",
            params![word],
            |row| row.get(0),
        )
        .optional()?;
    Ok(class)
}

fn placement_level_conn(conn: &Connection) -> Result<i64> {
    let start: Option<i64> = conn.query_row(
        "SELECT MIN(frequency_class) FROM word WHERE seen = 0",
        [],
        |row| row.get(0),
    )?;
    let difficulty = load_difficulty(conn)?;
    Ok(srs::placement_level(
        start.unwrap_or(DEFAULT_START_CLASS),
        &difficulty,
    ))
}

fn get_review(conn: &Connection, word: &str) -> Result<Option<Review>> {
    let review = conn
        .query_row(
            "SELECT word, learned_at, reviewed_at, interval_hours, due_at,
                    correct, streak, sequence_number
             FROM review WHERE word = ?1",
            params![word],
            row_to_review,
        )
        .optional()?;
    Ok(review)
}

fn select_reviews<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    sql_params: P,
) -> Result<Vec<Review>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(sql_params, row_to_review)?;
    let mut reviews = Vec::new();
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        word: row.get(0)?,
        learned_at: unix_datetime(row.get(1)?)?,
        reviewed_at: unix_datetime(row.get(2)?)?,
        interval_hours: row.get(3)?,
        due_at: unix_datetime(row.get(4)?)?,
        correct: row.get(5)?,
        streak: row.get(6)?,
        sequence_number: row.get(7)?,
    })
}

fn unix_datetime(secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, secs))
}

fn upsert_review(conn: &Connection, review: &Review, acknowledged: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO review (word, learned_at, reviewed_at, interval_hours, due_at,
                             correct, streak, sequence_number, acknowledged)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (word) DO UPDATE SET
             learned_at = excluded.learned_at,
             reviewed_at = excluded.reviewed_at,
             interval_hours = excluded.interval_hours,
             due_at = excluded.due_at,
             correct = excluded.correct,
             streak = excluded.streak,
             sequence_number = excluded.sequence_number,
             acknowledged = excluded.acknowledged",
        params![
            review.word,
            review.learned_at.timestamp(),
            review.reviewed_at.timestamp(),
            review.interval_hours,
            review.due_at.timestamp(),
            review.correct,
            review.streak,
            review.sequence_number,
            acknowledged,
        ],
    )?;
    Ok(())
}

fn load_intervals(conn: &Connection) -> Result<IntervalHistogram> {
    Ok(IntervalHistogram::from_rows(load_counts(
        conn,
        "SELECT interval_hours, correct, incorrect FROM interval_stats",
    )?))
}

fn load_difficulty(conn: &Connection) -> Result<DifficultyHistogram> {
    Ok(DifficultyHistogram::from_rows(load_counts(
        conn,
        "SELECT frequency_class, correct, incorrect FROM difficulty_stats",
    )?))
}

fn load_counts(conn: &Connection, sql: &str) -> Result<Vec<(i64, BucketCounts)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get(0)?,
            BucketCounts {
                correct: row.get(1)?,
                incorrect: row.get(2)?,
            },
        ))
    })?;
    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

fn replace_interval_stats(conn: &Connection, intervals: &IntervalHistogram) -> Result<()> {
    conn.execute("DELETE FROM interval_stats", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO interval_stats (interval_hours, correct, incorrect) VALUES (?1, ?2, ?3)",
    )?;
    for (hours, counts) in intervals.iter() {
        stmt.execute(params![hours, counts.correct, counts.incorrect])?;
    }
    Ok(())
}

fn replace_difficulty_stats(conn: &Connection, difficulty: &DifficultyHistogram) -> Result<()> {
    conn.execute("DELETE FROM difficulty_stats", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO difficulty_stats (frequency_class, correct, incorrect) VALUES (?1, ?2, ?3)",
    )?;
    for (class, counts) in difficulty.iter() {
        stmt.execute(params![class, counts.correct, counts.incorrect])?;
    }
    Ok(())
}
