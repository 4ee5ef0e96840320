//! Storage Module
//!
//! SQLite-based persistence for one review log:
//! - the review table, mutated in place per item
//! - interval and difficulty histogram tables
//! - the word-frequency reference table
//! - the per-log sequence counter

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{BulkImportReport, Result, ReviewListener, Store, StoreError};
