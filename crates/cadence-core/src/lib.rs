//! # Cadence Core
//!
//! Adaptive spaced-repetition engine for vocabulary learning:
//!
//! - **Review Scheduler**: computes the next due date for an answered item
//!   against a ladder of interval buckets
//! - **Auto-Tuner**: Wilson-scored statistics drift the ladder's boundaries
//!   toward intervals where real accuracy sits between 80% and 87.5%
//! - **Placement Estimator**: picks the vocabulary frequency class a
//!   learner is ready for
//! - **Log Reconciler**: merges an offline review log with the
//!   authoritative one (authority-wins, no CRDT machinery)
//!
//! The client-local and server-held logs are two deployments of this one
//! crate against different store locations, so the scheduling logic cannot
//! drift between them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_core::{Store, run_sync};
//!
//! // Open the per-account store (default platform-specific location)
//! let store = Store::open(None)?;
//!
//! // Record an answer; scheduling, statistics, and tuning are one transaction
//! let review = store.submit_answer_now("ephemeral", true)?;
//! println!("next review due {}", review.due_at);
//!
//! // What should the learner study next?
//! let due = store.due_items(chrono::Utc::now(), Some(20))?;
//! let fresh = store.new_word_candidates(10)?;
//!
//! // Reconcile with the server over a caller-supplied transport
//! let conflict = run_sync(&store, &transport)?;
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod srs;
pub mod storage;
pub mod sync;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Scheduling core
pub use srs::{
    BucketCounts, DifficultyHistogram, INITIAL_INTERVAL_HOURS, IntervalHistogram,
    MAX_INTERVAL_HOURS, Review, ReviewOutcome, TUNE_FLOOR_HOURS, TuneOutcome, WordEntry, auto_tune,
    is_crammed, is_too_easy, is_too_hard, next_review, placement_level, wilson,
};

// Storage layer
pub use storage::{BulkImportReport, Result, ReviewListener, Store, StoreError};

// Log reconciliation
pub use sync::{
    SyncRequest, SyncResponse, SyncReview, SyncTransport, build_sync_request, handle_sync,
    run_sync,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        BulkImportReport, Result, Review, ReviewOutcome, Store, StoreError, SyncRequest,
        SyncResponse, SyncTransport, WordEntry, handle_sync, run_sync,
    };
}
