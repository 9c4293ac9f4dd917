//! Live models shared with the rendering layer
//!
//! The sync task owns the `watch` senders; everything outside it only ever
//! sees receivers. Each write goes through a single `send_*` call, so a
//! reader never observes a half-applied update.

use std::collections::VecDeque;

use tokio::sync::watch;

use crate::models::{LogEntry, Status};

/// Connection status as seen by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Data may be missing or stale
    Disconnected,
    /// Bootstrapped and receiving pushes
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connected => f.write_str("connected"),
        }
    }
}

/// Phase of the channel manager state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Disconnected,
    Bootstrapping,
    Connected,
}

impl ChannelPhase {
    /// The externally visible connection state for this phase
    pub fn connection_state(self) -> ConnectionState {
        match self {
            ChannelPhase::Connected => ConnectionState::Connected,
            ChannelPhase::Disconnected | ChannelPhase::Bootstrapping => {
                ConnectionState::Disconnected
            }
        }
    }
}

/// Newest-first log entries with a fixed capacity
///
/// Entries beyond the capacity are evicted from the old end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// Bumped each time a snapshot replaces the contents
    generation: u64,
    /// Streamed entries pushed since the last snapshot
    pushed: u64,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            generation: 0,
            pushed: 0,
        }
    }

    /// Seed from a bootstrap read that is already newest-first
    pub fn from_newest_first(entries: Vec<LogEntry>, capacity: usize) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.reseed(entries);
        buffer
    }

    /// Replace the contents with a bootstrap read, newest first
    pub fn reseed(&mut self, entries: Vec<LogEntry>) {
        let mut entries = VecDeque::from(entries);
        entries.truncate(self.capacity);
        self.entries = entries;
        self.generation += 1;
        self.pushed = 0;
    }

    /// Insert a streamed entry in front of everything else
    pub fn push_front(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.pushed += 1;
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Reader position in a [`LogBuffer`]
///
/// Lets a renderer pick up streamed entries straight from the model, in
/// arrival order, without relying on the event channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    generation: u64,
    pushed: u64,
}

impl LogCursor {
    /// A cursor that has already seen everything in `buffer`
    pub fn at_end(buffer: &LogBuffer) -> Self {
        Self {
            generation: buffer.generation,
            pushed: buffer.pushed,
        }
    }

    /// Streamed entries added since the last call, oldest first
    ///
    /// A new snapshot moves the cursor to its end and yields nothing; the
    /// snapshot itself is not streamed. Entries evicted before they were read
    /// are skipped.
    pub fn advance(&mut self, buffer: &LogBuffer) -> Vec<LogEntry> {
        if buffer.generation != self.generation || buffer.pushed < self.pushed {
            *self = Self::at_end(buffer);
            return Vec::new();
        }

        let unseen = usize::try_from(buffer.pushed - self.pushed).unwrap_or(usize::MAX);
        self.pushed = buffer.pushed;
        let mut fresh: Vec<LogEntry> = buffer
            .entries
            .iter()
            .take(unseen)
            .cloned()
            .collect();
        fresh.reverse();
        fresh
    }
}

/// Read-only views of the live models
#[derive(Debug, Clone)]
pub struct Observers {
    pub status: watch::Receiver<Option<Status>>,
    pub logs: watch::Receiver<LogBuffer>,
    pub connection: watch::Receiver<ConnectionState>,
    pub phase: watch::Receiver<ChannelPhase>,
}

/// Writer side of the live models
#[derive(Debug)]
pub struct LiveState {
    status: watch::Sender<Option<Status>>,
    logs: watch::Sender<LogBuffer>,
    connection: watch::Sender<ConnectionState>,
    phase: watch::Sender<ChannelPhase>,
}

impl LiveState {
    pub fn new(log_capacity: usize) -> Self {
        let (status, _) = watch::channel(None);
        let (logs, _) = watch::channel(LogBuffer::new(log_capacity));
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let (phase, _) = watch::channel(ChannelPhase::Disconnected);

        Self {
            status,
            logs,
            connection,
            phase,
        }
    }

    pub fn observers(&self) -> Observers {
        Observers {
            status: self.status.subscribe(),
            logs: self.logs.subscribe(),
            connection: self.connection.subscribe(),
            phase: self.phase.subscribe(),
        }
    }

    /// Overwrite both models with a fresh bootstrap snapshot
    pub fn apply_snapshot(&self, status: Status, logs: Vec<LogEntry>) {
        self.status.send_replace(Some(status));
        self.logs.send_modify(|buffer| buffer.reseed(logs));
    }

    /// Replace the status wholesale
    pub fn replace_status(&self, status: Status) {
        self.status.send_replace(Some(status));
    }

    pub fn prepend_log(&self, entry: LogEntry) {
        self.logs.send_modify(|buffer| buffer.push_front(entry));
    }

    pub fn phase(&self) -> ChannelPhase {
        *self.phase.borrow()
    }

    /// Move the state machine, deriving the connection state from it
    ///
    /// Returns `true` if the externally visible connection state changed.
    pub fn set_phase(&self, next: ChannelPhase) -> bool {
        self.phase.send_if_modified(|phase| {
            let changed = *phase != next;
            *phase = next;
            changed
        });

        let derived = next.connection_state();
        self.connection.send_if_modified(|connection| {
            let changed = *connection != derived;
            *connection = derived;
            changed
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }
}
