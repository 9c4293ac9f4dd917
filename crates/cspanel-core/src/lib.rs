//! cspanel core library
//!
//! Client-side live state for the CS server control panel: the current
//! server status and a newest-first log buffer, bootstrapped over HTTP and
//! kept current over a WebSocket push channel.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut handle = SyncHandle::connect(&config)?;
//!
//! let mut connection = handle.connection_state();
//! connection.wait_for(|c| c.is_connected()).await?;
//! println!("{:?}", handle.status().borrow());
//!
//! handle.teardown().await;
//! ```
//!
//! # Modules
//!
//! - `sync`: Bootstrap, push channel and the sync task (main entry point)
//! - `api`: Request/response reads of status and logs
//! - `models`: Status and log entry types
//! - `config`: Application configuration
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;

pub use api::{HttpApi, StatusApi};
pub use config::Config;
pub use error::{ErrorResponse, SyncError, SyncResult};
pub use models::{LogEntry, ServerState, Status};
pub use sync::{ConnectionState, LogBuffer, LogCursor, SyncEvent, SyncHandle};
