//! Initial snapshot loading
//!
//! Reads the current status and the most recent log entries. The two reads
//! succeed or fail together; nothing is written to the live models here.

use tracing::debug;

use crate::api::StatusApi;
use crate::error::SyncResult;
use crate::models::{LogEntry, Status};

/// Default number of log entries requested on bootstrap
pub const DEFAULT_LOG_COUNT: usize = 500;

/// Authoritative state read over request/response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub status: Status,
    /// Newest first
    pub logs: Vec<LogEntry>,
}

/// Fetch status and logs concurrently
///
/// If either read fails the whole snapshot fails.
pub async fn bootstrap(api: &dyn StatusApi, log_count: usize) -> SyncResult<Snapshot> {
    let (status, mut logs) = tokio::try_join!(api.get_status(), api.get_logs(log_count))?;
    logs.truncate(log_count);

    debug!(state = %status.state, logs = logs.len(), "bootstrap snapshot loaded");
    Ok(Snapshot { status, logs })
}
