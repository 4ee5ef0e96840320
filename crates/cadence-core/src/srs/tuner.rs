//! Interval auto-tuner
//!
//! A self-calibrating quantizer for the interval ladder. It runs once per
//! review save, keyed by the interval the review was answered at, and nudges
//! bucket boundaries toward values where real per-item accuracy sits between
//! 80% and 87.5%. No batch retraining pass: each tune touches at most one new
//! bucket.
//!
//! When a bucket proves too easy, the represented interval is narrowed by
//! inserting a fresh bucket at the midpoint toward the next-longer neighbor
//! and deleting the original; future reviews at this point in the ladder get
//! the lengthened midpoint. Too hard is the symmetric operation toward the
//! next-shorter neighbor. The deleted bucket's accumulated counts are
//! discarded; existing reviews that reference it are left untouched
//! (historical accuracy over current policy).

use super::histogram::IntervalHistogram;
use super::wilson::{is_too_easy, is_too_hard};

/// Intervals at or below this are never tuned, which keeps the two initial
/// buckets (0 and 24 hours) stable and the ladder non-empty forever.
pub const TUNE_FLOOR_HOURS: i64 = 24;

/// Structural change performed by one tuner run, so a storage layer can
/// mirror it with row-level operations inside the same transaction as the
/// review write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuneOutcome {
    /// Key of the fresh zero-count bucket, if one was inserted.
    pub inserted: Option<i64>,
    /// Key of the deleted bucket, if one was removed.
    pub removed: Option<i64>,
}

impl TuneOutcome {
    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.inserted.is_none() && self.removed.is_none()
    }
}

/// Tune the ladder around the bucket at `interval`.
///
/// No-ops when the interval is at or below the floor, when the bucket is
/// absent (a legitimate transient state during ladder restructuring), when
/// there is no neighbor to move toward (the largest bucket is an explicit
/// cap, and nothing sits below the smallest), when the buckets are already
/// adjacent, or when the evidence supports neither predicate.
///
/// Idempotent at a fixed statistics snapshot: a successful tune deletes the
/// keyed bucket, so running it again without new data is a no-op.
pub fn auto_tune(intervals: &mut IntervalHistogram, interval: i64) -> TuneOutcome {
    if interval <= TUNE_FLOOR_HOURS {
        return TuneOutcome::default();
    }
    let Some(counts) = intervals.get(interval) else {
        return TuneOutcome::default();
    };

    if is_too_easy(counts.correct, counts.incorrect) {
        match intervals.bucket_above(interval) {
            Some(next) => shift_bucket(intervals, interval, next),
            // Already at the interval ceiling.
            None => TuneOutcome::default(),
        }
    } else if is_too_hard(counts.correct, counts.incorrect) {
        match intervals.bucket_below(interval) {
            Some(prev) => shift_bucket(intervals, interval, prev),
            None => TuneOutcome::default(),
        }
    } else {
        TuneOutcome::default()
    }
}

/// Replace the bucket at `interval` with one at the midpoint toward
/// `neighbor`.
fn shift_bucket(intervals: &mut IntervalHistogram, interval: i64, neighbor: i64) -> TuneOutcome {
    let mid = (interval + neighbor) / 2;
    if mid == interval {
        // Buckets are only one hour apart; nowhere to move.
        return TuneOutcome::default();
    }

    let mut outcome = TuneOutcome {
        inserted: None,
        removed: Some(interval),
    };
    if mid != neighbor {
        intervals.insert_empty(mid);
        outcome.inserted = Some(mid);
    }
    intervals.remove(interval);
    outcome
}
