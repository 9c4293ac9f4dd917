//! Watch command handler

use anyhow::{Context, Result};
use tracing::{debug, warn};

use cspanel_core::{Config, ConnectionState, LogCursor, SyncEvent, SyncHandle};

use crate::output::Output;

/// Follow status and logs live until Ctrl-C
///
/// Status and log lines are rendered from the live models; the event stream
/// only drives connection notices and errors.
pub async fn watch(config: &Config, output: &Output) -> Result<()> {
    output.message(&format!("Connecting to {}...", config.server_url));

    let mut handle = SyncHandle::connect(config).context("Failed to start sync")?;
    let mut events = handle
        .take_events()
        .context("Sync events already taken")?;
    let mut status = handle.status();
    let mut logs = handle.logs();
    let mut cursor = LogCursor::at_end(&logs.borrow_and_update());

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break signal.context("Failed to listen for Ctrl-C");
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = status.borrow_and_update().clone();
                if let Some(current) = current {
                    if let Err(e) = output.print_status_update(&current) {
                        break Err(e);
                    }
                }
            }
            changed = logs.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let fresh = cursor.advance(&logs.borrow_and_update());
                if let Err(e) = fresh.iter().try_for_each(|entry| output.print_log_entry(entry)) {
                    break Err(e);
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break Ok(());
                };
                print_event(&handle, event, output);
            }
        }
    };

    handle.teardown().await;
    result
}

fn print_event(handle: &SyncHandle, event: SyncEvent, output: &Output) {
    match event {
        SyncEvent::ConnectionChanged(state) => {
            output.print_connection(state);
            if state == ConnectionState::Connected && !output.is_json() {
                let loaded = handle.logs().borrow().len();
                output.message(&format!("{} log entries loaded", loaded));
            }
        }
        SyncEvent::Error(e) => {
            warn!("sync error: {}", e);
            if !output.is_quiet() {
                eprintln!("Sync error: {}", e);
            }
        }
        // Rendered from the models
        SyncEvent::StatusUpdated(_) | SyncEvent::LogReceived(_) => {}
    }
}
