//! Routing of push messages into the live models

use tracing::{debug, warn};

use super::message::InboundMessage;
use super::state::LiveState;
use crate::models::{LogEntry, Status};

/// What a single push message did to the models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    StatusReplaced(Status),
    LogPrepended(LogEntry),
    /// Malformed or unrecognized; nothing changed
    Dropped,
}

/// Decode one text frame and apply it
///
/// Never fails: a frame that does not decode is logged and dropped so the
/// channel stays open.
pub fn dispatch(state: &LiveState, raw: &str) -> DispatchOutcome {
    match InboundMessage::decode(raw) {
        Ok(InboundMessage::StatusUpdate(status)) => {
            debug!(state = %status.state, players = status.player_count, "status update");
            state.replace_status(status.clone());
            DispatchOutcome::StatusReplaced(status)
        }
        Ok(InboundMessage::LogUpdate(entry)) => {
            state.prepend_log(entry.clone());
            DispatchOutcome::LogPrepended(entry)
        }
        Ok(InboundMessage::Unknown { kind }) => {
            warn!(%kind, raw, "unexpected push message type");
            DispatchOutcome::Dropped
        }
        Err(e) => {
            warn!(error = %e, raw, "dropping malformed push message");
            DispatchOutcome::Dropped
        }
    }
}
