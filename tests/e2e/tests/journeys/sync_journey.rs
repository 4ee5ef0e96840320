//! Sync Journey Tests
//!
//! Full reconciliation cycles between on-disk stores: offline-first pushes,
//! multi-device convergence, lost acknowledgments, and tuned-ladder
//! propagation.

use cadence_core::{
    Store, StoreError, SyncRequest, SyncResponse, SyncTransport, handle_sync, run_sync,
};
use cadence_e2e_tests::harness::{Loopback, SyncedPair, TestDevice};
use cadence_e2e_tests::mocks::TestDataFactory;
use chrono::Duration;

#[test]
fn test_offline_study_then_push() {
    let pair = SyncedPair::new();
    let t0 = TestDataFactory::t0();
    pair.local.store.submit_answer("chien", true, t0).unwrap();
    pair.local.store.submit_answer("chat", false, t0).unwrap();

    assert!(!pair.sync());

    // The authority holds the same log and statistics.
    let pushed = pair.authority.store.review("chien").unwrap().unwrap();
    assert_eq!(pushed.interval_hours, 24);
    assert_eq!(pushed.sequence_number, 1);
    assert_eq!(
        pair.authority.store.interval_snapshot().unwrap(),
        pair.local.store.interval_snapshot().unwrap()
    );

    // A second cycle with nothing new changes nothing.
    assert!(!pair.sync());
}

#[test]
fn test_two_devices_converge_through_the_authority() {
    let pair = SyncedPair::new();
    let device_b = TestDevice::new_temp();
    let t0 = TestDataFactory::t0();

    // Device A studies and pushes.
    pair.local.store.submit_answer("chien", true, t0).unwrap();
    pair.local.store.submit_answer("chat", true, t0).unwrap();
    assert!(!pair.sync());

    // Device B's first sync is a conflict: it adopts A's log wholesale.
    let to_authority = Loopback::new(&pair.authority.store);
    assert!(run_sync(&device_b.store, &to_authority).unwrap());
    assert!(device_b.store.review("chien").unwrap().is_some());

    // Device B then studies a new word and pushes it cleanly.
    device_b
        .store
        .submit_answer("loup", true, t0 + Duration::hours(1))
        .unwrap();
    assert!(!run_sync(&device_b.store, &to_authority).unwrap());

    // Device A pulls B's work on its next sync.
    assert!(pair.sync());
    let on_a = pair.local.store.review("loup").unwrap().unwrap();
    let on_b = device_b.store.review("loup").unwrap().unwrap();
    assert_eq!(on_a, on_b);
    assert_eq!(on_a.sequence_number, 3);

    // All three stores agree on the histograms.
    let authoritative = pair.authority.store.interval_snapshot().unwrap();
    assert_eq!(pair.local.store.interval_snapshot().unwrap(), authoritative);
    assert_eq!(device_b.store.interval_snapshot().unwrap(), authoritative);
}

#[test]
fn test_lost_acknowledgment_recovers_on_the_next_sync() {
    let pair = SyncedPair::new();
    let t0 = TestDataFactory::t0();
    pair.local.store.submit_answer("chien", true, t0).unwrap();

    // The authority processes the upload but the acknowledgment never
    // arrives.
    struct DropResponse<'a> {
        authority: &'a Store,
    }
    impl SyncTransport for DropResponse<'_> {
        fn exchange(&self, request: &SyncRequest) -> cadence_core::Result<SyncResponse> {
            handle_sync(self.authority, request)?;
            Err(StoreError::Transport("connection reset".to_string()))
        }
    }
    let err = run_sync(
        &pair.local.store,
        &DropResponse {
            authority: &pair.authority.store,
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));

    // The authority kept the upload; locally nothing was acknowledged.
    assert!(pair.authority.store.review("chien").unwrap().is_some());

    // The next ordinary cycle resolves as a conflict and converges.
    assert!(pair.sync());
    let local = pair.local.store.review("chien").unwrap().unwrap();
    let authoritative = pair.authority.store.review("chien").unwrap().unwrap();
    assert_eq!(local, authoritative);

    // New local work numbers past the adopted entry.
    let next = pair
        .local
        .store
        .submit_answer("chat", true, t0 + Duration::hours(1))
        .unwrap();
    assert_eq!(next.sequence_number, authoritative.sequence_number + 1);
}

#[test]
fn test_quiet_cycle_changes_nothing() {
    let pair = SyncedPair::new();
    let t0 = TestDataFactory::t0();
    pair.local.store.submit_answer("chien", true, t0).unwrap();
    assert!(!pair.sync());

    let local_review = pair.local.store.review("chien").unwrap();
    let local_intervals = pair.local.store.interval_snapshot().unwrap();
    let authority_intervals = pair.authority.store.interval_snapshot().unwrap();

    assert!(!pair.sync());

    assert_eq!(pair.local.store.review("chien").unwrap(), local_review);
    assert_eq!(pair.local.store.interval_snapshot().unwrap(), local_intervals);
    assert_eq!(
        pair.authority.store.interval_snapshot().unwrap(),
        authority_intervals
    );
}

#[test]
fn test_tuned_ladder_propagates_to_the_authority() {
    let pair = SyncedPair::new();
    let t0 = TestDataFactory::t0();

    // Five flawless words push the 48h rung's record to where the tuner
    // replaces it with a 72h rung.
    for word in ["un", "deux", "trois", "quatre", "cinq"] {
        TestDataFactory::drill(&pair.local.store, word, &[true, true, true], t0);
    }
    let tuned = pair.local.store.interval_snapshot().unwrap();
    assert!(tuned.get(48).is_none());
    assert!(tuned.get(72).is_some());

    assert!(!pair.sync());
    assert_eq!(pair.authority.store.interval_snapshot().unwrap(), tuned);
}
