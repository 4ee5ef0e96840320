//! Review scheduler
//!
//! Computes the next review for one answered item against the current
//! interval ladder. Pure: all persistence, histogram counting, and tuning
//! side effects belong to the storage layer, which runs them in the same
//! transaction as the review write. Both the client-local and the
//! authoritative deployments go through this one function, so the two logs
//! can never drift apart in scheduling behavior.

use chrono::{DateTime, Duration, Utc};

use super::histogram::{INITIAL_INTERVAL_HOURS, IntervalHistogram};
use super::review::Review;
use crate::storage::{Result, StoreError};

/// True when the item is being answered before it was due. Crammed reviews
/// do not advance the interval ladder and are excluded from histogram
/// statistics; they would otherwise bias accuracy upward by rewarding
/// re-drilling.
pub fn is_crammed(previous: Option<&Review>, now: DateTime<Utc>) -> bool {
    previous.is_some_and(|prev| now < prev.due_at)
}

/// Compute the next review of `word`.
///
/// Deterministic given a fixed `now`. Fails only on invalid input: a `now`
/// earlier than the previous review's `learned_at`.
///
/// The returned review carries `sequence_number = 0`; the owning log assigns
/// the real number at write time, after all other computation, to minimize
/// the window in which concurrent operations could collide.
pub fn next_review(
    word: &str,
    previous: Option<&Review>,
    correct: bool,
    now: DateTime<Utc>,
    intervals: &IntervalHistogram,
) -> Result<Review> {
    if let Some(prev) = previous {
        if now < prev.learned_at {
            return Err(StoreError::InvalidInput(format!(
                "review of {word:?} at {now} predates learned_at {}",
                prev.learned_at
            )));
        }
    }

    let (learned_at, interval_hours, streak) = match previous {
        // First answer to the item.
        None if correct => (now, INITIAL_INTERVAL_HOURS, 1),
        None => (now, 0, 0),
        // Reset: due immediately, learned_at preserved.
        Some(prev) if !correct => (prev.learned_at, 0, 0),
        // Crammed: the interval is unchanged and the ladder does not advance.
        Some(prev) if now < prev.due_at => (prev.learned_at, prev.interval_hours, prev.streak + 1),
        // On or past due: climb to the smallest bucket that covers the time
        // actually elapsed since the last review.
        Some(prev) => {
            let elapsed_hours = (now - prev.reviewed_at).num_hours();
            (
                prev.learned_at,
                intervals.bucket_at_or_above(elapsed_hours),
                prev.streak + 1,
            )
        }
    };

    Ok(Review {
        word: word.to_string(),
        learned_at,
        reviewed_at: now,
        interval_hours,
        due_at: now + Duration::hours(interval_hours),
        correct,
        streak,
        sequence_number: 0,
    })
}
