//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Word-frequency lists of configurable shape
//! - Review drilling helpers that walk real study timelines
//! - Pre-built accuracy scenarios for placement tests

use cadence_core::{Store, WordEntry};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Factory for creating test data
///
/// Generates word lists and drives stores through realistic study
/// timelines. Designed for composing journey scenarios.
///
/// # Example
///
/// ```rust,ignore
/// let store = Store::open(Some(path))?;
/// store.import_word_list(&TestDataFactory::french_word_list())?;
///
/// // Walk "bonjour" through three on-time correct answers
/// let end = TestDataFactory::drill(&store, "bonjour", &[true, true, true], TestDataFactory::t0());
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    /// Fixed study-start instant shared by the journey tests.
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    // ========================================================================
    // WORD LISTS
    // ========================================================================

    /// A small hand-picked word list spanning frequency classes 1-4.
    pub fn french_word_list() -> Vec<WordEntry> {
        [
            ("le", 1),
            ("de", 1),
            ("un", 1),
            ("chien", 2),
            ("maison", 2),
            ("manger", 2),
            ("fenetre", 3),
            ("oiseau", 3),
            ("voler", 3),
            ("ephemere", 4),
            ("crepuscule", 4),
        ]
        .into_iter()
        .map(|(word, class)| WordEntry::new(word, class))
        .collect()
    }

    /// A synthetic word list with `per_class` words in each of the classes
    /// `1..=classes`.
    pub fn word_list(classes: i64, per_class: usize) -> Vec<WordEntry> {
        let mut entries = Vec::with_capacity(classes as usize * per_class);
        for class in 1..=classes {
            for i in 0..per_class {
                entries.push(WordEntry::new(format!("word_{class}_{i}"), class));
            }
        }
        entries
    }

    // ========================================================================
    // STUDY TIMELINES
    // ========================================================================

    /// Submit a sequence of answers for one word, each one hour past its
    /// due date, so correct streaks climb the interval ladder. Returns the
    /// instant just after the last answer.
    pub fn drill(
        store: &Store,
        word: &str,
        answers: &[bool],
        start: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let mut now = start;
        for &correct in answers {
            let review = store
                .submit_answer(word, correct, now)
                .expect("Failed to submit drilled answer");
            now = review.due_at + Duration::hours(1);
        }
        now
    }

    /// Record `correct` right answers and `incorrect` wrong ones at one
    /// frequency class, each on a distinct word from [`Self::word_list`].
    ///
    /// The words must already be imported so the answers count toward the
    /// difficulty histogram.
    pub fn answer_class(store: &Store, class: i64, correct: usize, incorrect: usize) {
        let now = Self::t0();
        for i in 0..correct + incorrect {
            let word = format!("word_{class}_{i}");
            store
                .submit_answer(&word, i < correct, now)
                .expect("Failed to submit class answer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Store::open(Some(dir.path().join("test.db"))).unwrap();
        (store, dir)
    }

    #[test]
    fn test_word_list_shape() {
        let entries = TestDataFactory::word_list(3, 4);
        assert_eq!(entries.len(), 12);
        assert!(entries.iter().all(|e| !e.seen));
        assert_eq!(entries[0].frequency_class, 1);
        assert_eq!(entries[11].frequency_class, 3);
    }

    #[test]
    fn test_drill_climbs_the_ladder() {
        let (store, _dir) = create_test_store();
        TestDataFactory::drill(&store, "chien", &[true, true, true], TestDataFactory::t0());

        // 24h, then 48h, then 96h.
        let review = store.review("chien").unwrap().unwrap();
        assert_eq!(review.interval_hours, 96);
        assert_eq!(review.streak, 3);
    }

    #[test]
    fn test_answer_class_feeds_difficulty_stats() {
        let (store, _dir) = create_test_store();
        store
            .import_word_list(&TestDataFactory::word_list(2, 10))
            .unwrap();
        TestDataFactory::answer_class(&store, 1, 6, 2);

        let difficulty = store.difficulty_snapshot().unwrap();
        let counts = difficulty.get(1).unwrap();
        assert_eq!(counts.correct, 6);
        assert_eq!(counts.incorrect, 2);
    }
}
