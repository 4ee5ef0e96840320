//! End-to-End Test Support
//!
//! Shared harness and fixtures for the journey tests. The journey tests
//! exercise complete learner workflows against real on-disk stores rather
//! than unit-testing individual functions.
