//! Test Device Manager
//!
//! Provides isolated store instances for testing:
//! - Temporary per-device databases that are automatically cleaned up
//! - Reopening a device's store to exercise persistence
//! - Paired local/authoritative devices with an in-process sync transport

use cadence_core::{Store, SyncRequest, SyncResponse, SyncTransport, handle_sync, run_sync};
use std::path::PathBuf;
use tempfile::TempDir;

/// One learner device backed by its own store file
///
/// Each test device gets an isolated database to prevent interference.
/// The database is deleted when the device is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let device = TestDevice::new_temp();
/// device.store.submit_answer_now("bonjour", true)?;
/// ```
pub struct TestDevice {
    /// The device's store
    pub store: Store,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDevice {
    /// Create a device with a fresh store in a temporary directory.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("cadence.db");

        let store = Store::open(Some(db_path.clone())).expect("Failed to open test store");

        Self {
            store,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Create a device whose store lives at a specific path.
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let store = Store::open(Some(path.clone())).expect("Failed to open test store");

        Self {
            store,
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close and reopen the store, simulating an app restart.
    pub fn restart(&mut self) {
        self.store =
            Store::open(Some(self.db_path.clone())).expect("Failed to reopen test store");
    }
}

// ============================================================================
// SYNC PAIRING
// ============================================================================

/// In-process transport that answers each exchange from an authoritative
/// store directly, with no wire in between.
pub struct Loopback<'a> {
    authority: &'a Store,
}

impl<'a> Loopback<'a> {
    pub fn new(authority: &'a Store) -> Self {
        Self { authority }
    }
}

impl SyncTransport for Loopback<'_> {
    fn exchange(&self, request: &SyncRequest) -> cadence_core::Result<SyncResponse> {
        handle_sync(self.authority, request)
    }
}

/// A local device paired with an authoritative one.
///
/// Both sides are full stores in the same temporary directory; syncing runs
/// the real reconciliation code end to end through a [`Loopback`] transport.
pub struct SyncedPair {
    pub local: TestDevice,
    pub authority: TestDevice,
    _temp_dir: TempDir,
}

impl SyncedPair {
    /// Create a fresh local/authority pair.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let local = TestDevice::new_at_path(temp_dir.path().join("local.db"));
        let authority = TestDevice::new_at_path(temp_dir.path().join("authority.db"));

        Self {
            local,
            authority,
            _temp_dir: temp_dir,
        }
    }

    /// Run one sync cycle from the local side. Returns whether the cycle
    /// ended in a conflict.
    pub fn sync(&self) -> bool {
        run_sync(&self.local.store, &Loopback::new(&self.authority.store))
            .expect("sync cycle failed")
    }
}

impl Default for SyncedPair {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_device_creation() {
        let device = TestDevice::new_temp();
        assert!(device.path().exists());
        assert!(device.store.review("bonjour").unwrap().is_none());
    }

    #[test]
    fn test_restart_preserves_state() {
        let mut device = TestDevice::new_temp();
        device.store.submit_answer_now("bonjour", true).unwrap();

        device.restart();

        let review = device.store.review("bonjour").unwrap().unwrap();
        assert_eq!(review.interval_hours, 24);
    }

    #[test]
    fn test_synced_pair_round_trip() {
        let pair = SyncedPair::new();
        pair.local.store.submit_answer_now("bonjour", true).unwrap();

        assert!(!pair.sync());
        assert!(pair.authority.store.review("bonjour").unwrap().is_some());
    }
}
