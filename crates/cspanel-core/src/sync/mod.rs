//! Live state synchronization
//!
//! Keeps a local copy of the server status and log stream up to date.
//!
//! ## Protocol
//!
//! 1. Read the current status and the most recent logs over HTTP
//! 2. Open the WebSocket push channel
//! 3. Apply the snapshot and report `Connected`
//! 4. Apply `status` and `log` push messages as they arrive
//! 5. On error or close, report `Disconnected` and start over after a delay
//!
//! ## Usage
//!
//! ```ignore
//! let mut handle = SyncHandle::connect(&config)?;
//! let mut status = handle.status();
//! status.changed().await?;
//! handle.teardown().await;
//! ```

mod bootstrap;
mod channel;
mod dispatcher;
mod manager;
mod message;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{bootstrap, Snapshot, DEFAULT_LOG_COUNT};
pub use channel::{ChannelConnector, PushChannel, WebSocketChannel, WebSocketConnector};
pub use dispatcher::{dispatch, DispatchOutcome};
pub use manager::{spawn_sync_task, SyncCommand, SyncConfig, SyncEvent, SyncHandle};
pub use message::{InboundMessage, MessageError, KIND_LOG, KIND_STATUS};
pub use state::{ChannelPhase, ConnectionState, LiveState, LogBuffer, LogCursor, Observers};
