//! Sync wire format
//!
//! One request/response pair per sync cycle, JSON over whatever transport
//! the calling layer injects. The request uploads everything the local log
//! has that the authoritative log may not have seen; the response is either
//! an empty acknowledgment or the authoritative side's newer reviews plus
//! its histogram snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::srs::{DifficultyHistogram, IntervalHistogram, Review};
use crate::storage::{Result, StoreError};

/// A review as carried by the sync protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReview {
    /// The vocabulary item.
    pub word: String,
    /// When the item was first answered.
    pub learned: DateTime<Utc>,
    /// When the item was last answered.
    pub reviewed: DateTime<Utc>,
    /// Interval in hours; the due date is `reviewed + interval`.
    pub interval: i64,
    /// Whether the last answer was correct.
    pub correct: bool,
    /// Streak of correct answers including the last one.
    pub streak: i64,
    /// The entry's position in the log it came from.
    pub sequence_number: i64,
}

impl From<&Review> for SyncReview {
    fn from(review: &Review) -> Self {
        Self {
            word: review.word.clone(),
            learned: review.learned_at,
            reviewed: review.reviewed_at,
            interval: review.interval_hours,
            correct: review.correct,
            streak: review.streak,
            sequence_number: review.sequence_number,
        }
    }
}

impl SyncReview {
    /// Rebuild the full review entry; the due date is derived.
    pub fn to_review(&self) -> Review {
        Review {
            word: self.word.clone(),
            learned_at: self.learned,
            reviewed_at: self.reviewed,
            interval_hours: self.interval,
            due_at: self.reviewed + Duration::hours(self.interval),
            correct: self.correct,
            streak: self.streak,
            sequence_number: self.sequence_number,
        }
    }
}

/// What the local log uploads each sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Highest sequence number among the local log's acknowledged reviews,
    /// 0 if none.
    pub latest: i64,
    /// All locally-pending (unacknowledged) reviews, in sequence order.
    pub reviews: Vec<SyncReview>,
    /// JSON snapshot of the local difficulty histogram.
    pub difficulty_stats: String,
    /// JSON snapshot of the local interval histogram.
    pub interval_stats: String,
}

/// The authoritative side's answer.
///
/// Empty means the upload was accepted and acknowledged. A non-empty
/// `reviews` list means conflict: the authoritative log advanced
/// independently, the upload was ignored, and the local side must replace
/// its state with what is returned here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Authoritative reviews newer than the request's `latest`.
    #[serde(default)]
    pub reviews: Vec<SyncReview>,
    /// Authoritative difficulty histogram snapshot; empty on acknowledgment.
    #[serde(default)]
    pub difficulty_stats: String,
    /// Authoritative interval histogram snapshot; empty on acknowledgment.
    #[serde(default)]
    pub interval_stats: String,
}

impl SyncResponse {
    /// True when this is an empty acknowledgment rather than a conflict.
    pub fn is_ack(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Carries one sync exchange to the authoritative log.
///
/// The calling layer owns the actual wire (and any retry or backoff
/// policy); tests pair two stores with an in-process implementation.
pub trait SyncTransport {
    /// Deliver `request` and return the authoritative side's response.
    fn exchange(&self, request: &SyncRequest) -> Result<SyncResponse>;
}

/// Serialize a histogram snapshot blob.
pub(crate) fn encode_intervals(intervals: &IntervalHistogram) -> Result<String> {
    serde_json::to_string(intervals)
        .map_err(|err| StoreError::InvalidInput(format!("unserializable interval snapshot: {err}")))
}

/// Serialize a difficulty snapshot blob.
pub(crate) fn encode_difficulty(difficulty: &DifficultyHistogram) -> Result<String> {
    serde_json::to_string(difficulty).map_err(|err| {
        StoreError::InvalidInput(format!("unserializable difficulty snapshot: {err}"))
    })
}

/// Parse an interval snapshot blob. Malformed blobs are invalid input,
/// surfaced to the caller before any state is touched.
pub(crate) fn decode_intervals(blob: &str) -> Result<IntervalHistogram> {
    serde_json::from_str(blob)
        .map_err(|err| StoreError::InvalidInput(format!("malformed interval snapshot: {err}")))
}

/// Parse a difficulty snapshot blob.
pub(crate) fn decode_difficulty(blob: &str) -> Result<DifficultyHistogram> {
    serde_json::from_str(blob)
        .map_err(|err| StoreError::InvalidInput(format!("malformed difficulty snapshot: {err}")))
}
