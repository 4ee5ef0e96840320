//! Log reconciliation
//!
//! Merges a sequence-numbered local review log against the authoritative
//! log. Deliberately not a CRDT or vector-clock merge: the authority always
//! wins, which is cheap and exact for the common single-device case and
//! safe for the rare multi-device conflict - nothing is ever lost on the
//! authoritative side, and local unsynced edits are dropped rather than
//! corrupting shared state.
//!
//! Both ends of the protocol run against the same [`Store`] type; a
//! deployment is "local" or "authoritative" only by which of [`run_sync`]
//! and [`handle_sync`] it executes.

use crate::srs::Review;
use crate::storage::{Result, Store};

use super::protocol::{
    SyncRequest, SyncResponse, SyncReview, SyncTransport, decode_difficulty, decode_intervals,
    encode_difficulty, encode_intervals,
};

/// Snapshot the local log into an upload request.
pub fn build_sync_request(store: &Store) -> Result<SyncRequest> {
    let latest = store.latest_acknowledged()?;
    let pending = store.pending_reviews()?;
    Ok(SyncRequest {
        latest,
        reviews: pending.iter().map(SyncReview::from).collect(),
        difficulty_stats: encode_difficulty(&store.difficulty_snapshot()?)?,
        interval_stats: encode_intervals(&store.interval_snapshot()?)?,
    })
}

/// Run one sync cycle from the local side. Returns whether the cycle ended
/// in a conflict.
///
/// On an empty acknowledgment, every pending review moves into the
/// acknowledged log unchanged. On a conflict, the pending reviews are
/// discarded and the authoritative reviews, sequence position, and
/// histogram snapshots replace the local ones wholesale - in one
/// transaction, so an error (or a cancelled exchange) leaves the local log
/// in its self-consistent pre-sync state.
pub fn run_sync(store: &Store, transport: &dyn SyncTransport) -> Result<bool> {
    let request = build_sync_request(store)?;
    let pending = request.reviews.len();
    let response = transport.exchange(&request)?;

    if response.is_ack() {
        let acknowledged = store.acknowledge_pending()?;
        tracing::info!(acknowledged, "sync acknowledged");
        return Ok(false);
    }

    // Conflict: parse the authoritative snapshots before touching anything.
    let intervals = decode_intervals(&response.interval_stats)?;
    let difficulty = decode_difficulty(&response.difficulty_stats)?;
    let reviews: Vec<Review> = response
        .reviews
        .iter()
        .map(SyncReview::to_review)
        .collect();
    store.apply_conflict(&reviews, &intervals, &difficulty)?;
    tracing::info!(
        dropped = pending,
        replaced = reviews.len(),
        "sync conflict: local log replaced from authority"
    );
    Ok(true)
}

/// Answer one sync request on the authoritative side.
///
/// If this log holds reviews newer than the request's `latest`, the upload
/// is ignored entirely and those reviews are returned along with the
/// authoritative histogram snapshots. Otherwise the uploaded reviews are
/// appended under fresh sequence numbers, the uploader's snapshots are
/// adopted, and the response is an empty acknowledgment.
pub fn handle_sync(store: &Store, request: &SyncRequest) -> Result<SyncResponse> {
    let newer = store.reviews_after(request.latest)?;
    if !newer.is_empty() {
        tracing::info!(
            newer = newer.len(),
            ignored = request.reviews.len(),
            "sync conflict: authoritative log has advanced"
        );
        return Ok(SyncResponse {
            reviews: newer.iter().map(SyncReview::from).collect(),
            difficulty_stats: encode_difficulty(&store.difficulty_snapshot()?)?,
            interval_stats: encode_intervals(&store.interval_snapshot()?)?,
        });
    }

    if !request.reviews.is_empty() {
        let intervals = decode_intervals(&request.interval_stats)?;
        let difficulty = decode_difficulty(&request.difficulty_stats)?;
        let reviews: Vec<Review> = request.reviews.iter().map(SyncReview::to_review).collect();
        store.accept_upload(&reviews, &intervals, &difficulty)?;
        tracing::info!(accepted = reviews.len(), "sync upload accepted");
    }
    Ok(SyncResponse::default())
}
