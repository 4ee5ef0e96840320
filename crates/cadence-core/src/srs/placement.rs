//! Placement estimator
//!
//! Decides the frequency class at which new, never-seen words should be
//! introduced. The starting candidate is the class of the least-rare unseen
//! word; the walk over the per-class accuracy table then moves the candidate
//! up for as long as the learner demonstrably overperforms, and stops as
//! soon as a class looks appropriately challenging or outright too hard.
//!
//! The result biases item selection (an external collaborator): unseen words
//! at or above the returned class are the preferred "hard" candidates, words
//! below it are the "easy" fallback pool.

use super::histogram::DifficultyHistogram;
use super::wilson::{is_too_easy, is_too_hard};

/// Estimate the placement level.
///
/// `start_class` is the frequency class of the least-rare unseen word.
/// Difficulty buckets are walked in increasing class order:
///
/// - a too-hard class stops the walk and returns the previous candidate
///   (that class is already beyond the learner's ability);
/// - a class that is neither too hard nor too easy is adopted and returned
///   (appropriately challenged, not overperforming);
/// - if every walked class is too easy, the walk advances one past the last
///   observed class, into not-yet-attempted territory.
///
/// The result is never below `start_class`: the accuracy table can cover
/// classes whose words have all been seen already, and a middling record
/// there must not pull placement beneath the unseen pool.
///
/// Holding the unseen pool fixed, improving accuracy at any class never
/// decreases the result.
pub fn placement_level(start_class: i64, difficulty: &DifficultyHistogram) -> i64 {
    let mut level = start_class;
    let mut last_was_easy = false;

    for (class, counts) in difficulty.iter() {
        if is_too_hard(counts.correct, counts.incorrect) {
            return level.max(start_class);
        }
        level = class;
        last_was_easy = is_too_easy(counts.correct, counts.incorrect);
        if !last_was_easy {
            return level.max(start_class);
        }
    }

    let level = if last_was_easy { level + 1 } else { level };
    level.max(start_class)
}
