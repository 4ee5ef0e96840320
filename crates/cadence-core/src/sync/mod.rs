//! Sync Module
//!
//! The log-reconciliation protocol: wire types, the transport seam, and the
//! local/authoritative halves of the sync state machine.

mod protocol;
mod reconciler;

pub use protocol::{SyncRequest, SyncResponse, SyncReview, SyncTransport};
pub use reconciler::{build_sync_request, handle_sync, run_sync};
