//! Push channel message types
//!
//! Every frame on the push channel is a JSON envelope
//! `{ "type": "status" | "log", "message": <payload> }`.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{LogEntry, Status};

/// Discriminator for status snapshots
pub const KIND_STATUS: &str = "status";

/// Discriminator for single log entries
pub const KIND_LOG: &str = "log";

/// Raw envelope before the payload is interpreted
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<Value>,
}

/// Decoded push message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Complete replacement for the current status
    StatusUpdate(Status),
    /// One new log entry
    LogUpdate(LogEntry),
    /// Well-formed envelope with a discriminator we do not handle
    Unknown { kind: String },
}

/// Reasons a frame is rejected
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("not a message envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("'{kind}' message without payload")]
    MissingPayload { kind: String },

    #[error("invalid '{kind}' payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InboundMessage {
    /// Decode a text frame
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        let envelope: Envelope = serde_json::from_str(raw)?;

        let Some(payload) = envelope.message else {
            return Err(MessageError::MissingPayload {
                kind: envelope.kind,
            });
        };

        match envelope.kind.as_str() {
            KIND_STATUS => serde_json::from_value(payload)
                .map(InboundMessage::StatusUpdate)
                .map_err(|source| MessageError::InvalidPayload {
                    kind: envelope.kind,
                    source,
                }),
            KIND_LOG => serde_json::from_value(payload)
                .map(InboundMessage::LogUpdate)
                .map_err(|source| MessageError::InvalidPayload {
                    kind: envelope.kind,
                    source,
                }),
            _ => Ok(InboundMessage::Unknown {
                kind: envelope.kind,
            }),
        }
    }
}
