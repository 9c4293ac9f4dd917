//! In-memory collaborators for sync tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::channel::{ChannelConnector, PushChannel};
use crate::api::StatusApi;
use crate::error::{SyncError, SyncResult};
use crate::models::{LogEntry, ServerState, Status};

pub fn idle_status() -> Status {
    Status {
        state: ServerState::Idle,
        hostname: "srv".to_string(),
        map: "de_dust2".to_string(),
        player_count: 0,
        max_player_count: 10,
        ip: String::new(),
        port: String::new(),
        password: String::new(),
        is_game_server_installed: None,
    }
}

/// Status API with scripted failures
pub struct MockApi {
    status: Mutex<Status>,
    logs: Mutex<Vec<LogEntry>>,
    status_failures: AtomicUsize,
    log_failures: AtomicUsize,
    status_calls: AtomicUsize,
    log_requests: Mutex<Vec<usize>>,
}

impl MockApi {
    pub fn new(status: Status, logs: Vec<LogEntry>) -> Self {
        Self {
            status: Mutex::new(status),
            logs: Mutex::new(logs),
            status_failures: AtomicUsize::new(0),
            log_failures: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            log_requests: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `count` status reads fail with a 503
    pub fn fail_status(&self, count: usize) {
        self.status_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_logs(&self, count: usize) {
        self.log_failures.store(count, Ordering::SeqCst);
    }

    pub fn set_status(&self, status: Status) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_logs(&self, logs: Vec<LogEntry>) {
        *self.logs.lock().unwrap() = logs;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn log_requests(&self) -> Vec<usize> {
        self.log_requests.lock().unwrap().clone()
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl StatusApi for MockApi {
    async fn get_status(&self) -> SyncResult<Status> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.status_failures) {
            return Err(SyncError::UnexpectedStatus {
                path: "/status".to_string(),
                status: 503,
            });
        }
        Ok(self.status.lock().unwrap().clone())
    }

    async fn get_logs(&self, count: usize) -> SyncResult<Vec<LogEntry>> {
        self.log_requests.lock().unwrap().push(count);
        if take_failure(&self.log_failures) {
            return Err(SyncError::UnexpectedStatus {
                path: format!("/logs/{}", count),
                status: 503,
            });
        }
        Ok(self.logs.lock().unwrap().clone())
    }
}

/// What a scripted channel yields next
#[derive(Debug)]
pub enum Frame {
    Text(String),
    Error,
    Close,
}

#[derive(Default)]
struct ChannelCounters {
    opens: AtomicUsize,
    live: AtomicUsize,
}

/// Connector whose channels are driven by the test
#[derive(Default)]
pub struct MockConnector {
    counters: Arc<ChannelCounters>,
    open_failures: AtomicUsize,
    stall_close: AtomicBool,
    sessions: Mutex<Vec<Session>>,
}

/// Test side of one opened channel
#[derive(Clone)]
pub struct Session {
    frames: mpsc::UnboundedSender<Frame>,
    close_calls: Arc<AtomicUsize>,
}

impl Session {
    /// Feed a frame; returns `false` once the channel is gone
    pub fn send(&self, frame: Frame) -> bool {
        self.frames.send(frame).is_ok()
    }

    pub fn text(&self, raw: &str) -> bool {
        self.send(Frame::Text(raw.to_string()))
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_opens(&self, count: usize) {
        self.open_failures.store(count, Ordering::SeqCst);
    }

    /// Channels opened from now on never finish their close handshake
    pub fn stall_close(&self) {
        self.stall_close.store(true, Ordering::SeqCst);
    }

    /// Successful opens so far
    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    /// Channels opened and not yet closed
    pub fn live_channels(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn session(&self, index: usize) -> Session {
        self.sessions.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ChannelConnector for MockConnector {
    async fn open(&self, url: &str) -> SyncResult<Box<dyn PushChannel>> {
        if take_failure(&self.open_failures) {
            return Err(SyncError::Channel {
                url: url.to_string(),
                details: "connection refused".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let close_calls = Arc::new(AtomicUsize::new(0));
        self.sessions.lock().unwrap().push(Session {
            frames: tx,
            close_calls: Arc::clone(&close_calls),
        });
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ScriptedChannel {
            url: url.to_string(),
            frames: rx,
            close_calls,
            counters: Arc::clone(&self.counters),
            closed: false,
            stall_close: self.stall_close.load(Ordering::SeqCst),
        }))
    }
}

struct ScriptedChannel {
    url: String,
    frames: mpsc::UnboundedReceiver<Frame>,
    close_calls: Arc<AtomicUsize>,
    counters: Arc<ChannelCounters>,
    closed: bool,
    stall_close: bool,
}

#[async_trait]
impl PushChannel for ScriptedChannel {
    async fn next_frame(&mut self) -> Option<SyncResult<String>> {
        match self.frames.recv().await {
            Some(Frame::Text(text)) => Some(Ok(text)),
            Some(Frame::Error) => Some(Err(SyncError::Channel {
                url: self.url.clone(),
                details: "connection reset".to_string(),
            })),
            Some(Frame::Close) => None,
            // Test dropped the session: stay open until the manager gives up
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        // Every call is counted so tests can assert the manager closes once
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if !self.closed {
            self.closed = true;
            self.frames.close();
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
        if self.stall_close {
            std::future::pending::<()>().await;
        }
    }
}
