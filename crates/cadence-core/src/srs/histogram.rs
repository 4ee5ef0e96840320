//! Interval and difficulty histograms
//!
//! Both histograms are sorted ladders of buckets, each bucket accumulating
//! correct/incorrect counts:
//!
//! - [`IntervalHistogram`] is keyed by interval length in hours. It is seeded
//!   with geometrically-spaced buckets and restructured over time by the
//!   auto-tuner, but the ladder stays strictly increasing and never empty.
//! - [`DifficultyHistogram`] is keyed by word frequency class, one bucket per
//!   tier the learner has been tested at. Buckets appear on demand.
//!
//! Buckets are addressed by stable integer keys rather than linked to each
//! other, so structural mutation while a reader iterates a snapshot carries
//! no aliasing hazard. Both histograms serialize to JSON for the sync
//! protocol's snapshot blobs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Interval assigned to a brand-new item answered correctly, and the spacing
/// ratio base of the seeded ladder.
pub const INITIAL_INTERVAL_HOURS: i64 = 24;

/// Number of doublings in the seeded ladder above the initial interval.
pub const LADDER_DOUBLINGS: u32 = 15;

/// Largest interval the scheduler will ever assign, in hours (roughly 90
/// years). The top bucket is an explicit cap: it cannot be lengthened.
pub const MAX_INTERVAL_HOURS: i64 = INITIAL_INTERVAL_HOURS << LADDER_DOUBLINGS;

/// Correct/incorrect counters of one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    /// Correct answers recorded at this bucket.
    pub correct: u32,
    /// Incorrect answers recorded at this bucket.
    pub incorrect: u32,
}

// ============================================================================
// INTERVAL HISTOGRAM
// ============================================================================

/// Sorted ladder of interval buckets, keyed by hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalHistogram {
    buckets: BTreeMap<i64, BucketCounts>,
}

impl IntervalHistogram {
    /// The seeded ladder: `{0, 24, 48, 96, ..., 24 * 2^15}` - a zero bucket
    /// plus sixteen geometrically-spaced buckets spanning one day to roughly
    /// ninety years.
    pub fn seeded() -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(0, BucketCounts::default());
        for doubling in 0..=LADDER_DOUBLINGS {
            buckets.insert(INITIAL_INTERVAL_HOURS << doubling, BucketCounts::default());
        }
        Self { buckets }
    }

    /// Rebuild from persisted rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (i64, BucketCounts)>) -> Self {
        Self {
            buckets: rows.into_iter().collect(),
        }
    }

    /// Counters of the bucket at exactly `hours`, if it exists.
    pub fn get(&self, hours: i64) -> Option<BucketCounts> {
        self.buckets.get(&hours).copied()
    }

    /// Smallest bucket key at or above `hours`. If none exists the interval
    /// is past the top of the ladder and the largest bucket is returned (the
    /// maximum-interval cap).
    pub fn bucket_at_or_above(&self, hours: i64) -> i64 {
        self.buckets
            .range(hours..)
            .next()
            .map(|(&key, _)| key)
            .or_else(|| self.buckets.keys().next_back().copied())
            .unwrap_or(0)
    }

    /// Smallest bucket key strictly above `hours`. `None` means `hours` is
    /// at or past the top of the ladder.
    pub fn bucket_above(&self, hours: i64) -> Option<i64> {
        self.buckets.range(hours + 1..).next().map(|(&key, _)| key)
    }

    /// Largest bucket key strictly below `hours`. `None` means there is no
    /// bucket below the smallest.
    pub fn bucket_below(&self, hours: i64) -> Option<i64> {
        self.buckets.range(..hours).next_back().map(|(&key, _)| key)
    }

    /// Record one answer against the bucket at exactly `hours`. Returns
    /// false when no such bucket exists (it may have been merged away since
    /// the review was scheduled); absence is tolerated, not corrected.
    pub fn record(&mut self, hours: i64, correct: bool) -> bool {
        match self.buckets.get_mut(&hours) {
            Some(counts) => {
                if correct {
                    counts.correct += 1;
                } else {
                    counts.incorrect += 1;
                }
                true
            }
            None => false,
        }
    }

    /// Insert a fresh bucket with zero counts. No-op if the key exists.
    pub fn insert_empty(&mut self, hours: i64) {
        self.buckets.entry(hours).or_default();
    }

    /// Remove the bucket at `hours`, discarding its accumulated counts.
    pub fn remove(&mut self, hours: i64) -> Option<BucketCounts> {
        self.buckets.remove(&hours)
    }

    /// Bucket keys and counters in increasing key order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, BucketCounts)> + '_ {
        self.buckets.iter().map(|(&key, &counts)| (key, counts))
    }

    /// Number of buckets in the ladder.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when the ladder has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for IntervalHistogram {
    fn default() -> Self {
        Self::seeded()
    }
}

// ============================================================================
// DIFFICULTY HISTOGRAM
// ============================================================================

/// Per-frequency-class accuracy statistics, keyed by class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyHistogram {
    buckets: BTreeMap<i64, BucketCounts>,
}

impl DifficultyHistogram {
    /// Empty table - no tier tested yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (i64, BucketCounts)>) -> Self {
        Self {
            buckets: rows.into_iter().collect(),
        }
    }

    /// Counters for `frequency_class`, if the learner has been tested there.
    pub fn get(&self, frequency_class: i64) -> Option<BucketCounts> {
        self.buckets.get(&frequency_class).copied()
    }

    /// Record one answer at `frequency_class`, creating the bucket on the
    /// first test at that tier.
    pub fn record(&mut self, frequency_class: i64, correct: bool) {
        let counts = self.buckets.entry(frequency_class).or_default();
        if correct {
            counts.correct += 1;
        } else {
            counts.incorrect += 1;
        }
    }

    /// Buckets in increasing difficulty order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, BucketCounts)> + '_ {
        self.buckets.iter().map(|(&key, &counts)| (key, counts))
    }

    /// Number of tiers tested.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no tier has been tested.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
