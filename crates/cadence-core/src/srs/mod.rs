//! Spaced-repetition core
//!
//! Pure scheduling logic, no I/O:
//! - Wilson score confidence bounds on bucket accuracy
//! - the interval and difficulty histograms
//! - the statistics-driven interval auto-tuner
//! - the next-review computation
//! - the placement estimator
//!
//! The storage layer wires these together inside one transaction per
//! answered item.

mod histogram;
mod placement;
mod review;
mod scheduler;
mod tuner;
mod wilson;

pub use histogram::{
    BucketCounts, DifficultyHistogram, INITIAL_INTERVAL_HOURS, IntervalHistogram,
    LADDER_DOUBLINGS, MAX_INTERVAL_HOURS,
};
pub use placement::placement_level;
pub use review::{Review, ReviewOutcome, WordEntry};
pub use scheduler::{is_crammed, next_review};
pub use tuner::{auto_tune, TUNE_FLOOR_HOURS, TuneOutcome};
pub use wilson::{is_too_easy, is_too_hard, wilson};
