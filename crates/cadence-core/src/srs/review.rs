//! Review - the scheduling state of one vocabulary item
//!
//! A `Review` is created on the first answer to an item and mutated in place
//! (same word key) on every answer after that. Inside a log being reconciled
//! it is treated as an immutable entry instead: entries are pushed and pulled
//! wholesale, never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduling state of a single vocabulary item.
///
/// Invariant: `due_at == reviewed_at + interval_hours`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// The vocabulary item this review belongs to.
    pub word: String,
    /// When the item was first answered. Preserved across resets.
    pub learned_at: DateTime<Utc>,
    /// When the item was last answered.
    pub reviewed_at: DateTime<Utc>,
    /// Interval between this review and the due date, in hours.
    ///
    /// Equals some interval-bucket key at the moment it was computed. The
    /// bucket may have been merged away since; that is tolerated, not
    /// corrected.
    pub interval_hours: i64,
    /// When the item should be tested next.
    pub due_at: DateTime<Utc>,
    /// Whether the last answer was correct.
    pub correct: bool,
    /// Length of the streak of correct answers, including the current one.
    pub streak: i64,
    /// Position in the owning log. Assigned by that log at write time,
    /// strictly increasing, never reused.
    pub sequence_number: i64,
}

/// One answered item, as submitted by a caller or a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// The answered word.
    pub word: String,
    /// Whether the answer was correct.
    pub correct: bool,
}

impl ReviewOutcome {
    /// Convenience constructor.
    pub fn new(word: impl Into<String>, correct: bool) -> Self {
        Self {
            word: word.into(),
            correct,
        }
    }
}

/// An entry in the word-frequency reference table.
///
/// Static data populated from an external word list. The core never mutates
/// it except for the `seen` flag, which flips once when the word is first
/// answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    /// The word itself.
    pub word: String,
    /// Rank tier of commonness; lower classes are more frequent and serve as
    /// a proxy for lower difficulty.
    pub frequency_class: i64,
    /// Whether the learner has been tested on this word at least once.
    pub seen: bool,
}

impl WordEntry {
    /// A fresh, unseen entry.
    pub fn new(word: impl Into<String>, frequency_class: i64) -> Self {
        Self {
            word: word.into(),
            frequency_class,
            seen: false,
        }
    }
}
