//! Persistent sync task
//!
//! Owns the push channel and the live models. One task runs the state
//! machine `Disconnected -> Bootstrapping -> Connected -> Disconnected` and
//! retries after a fixed delay until it is torn down. Attempts never overlap:
//! the next bootstrap only starts once the previous session has ended and the
//! delay has elapsed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::bootstrap::{bootstrap, DEFAULT_LOG_COUNT};
use super::channel::{ChannelConnector, PushChannel, WebSocketConnector};
use super::dispatcher::{dispatch, DispatchOutcome};
use super::state::{ChannelPhase, ConnectionState, LiveState, LogBuffer, Observers};
use crate::api::{HttpApi, StatusApi};
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::models::{LogEntry, Status};

/// How long teardown waits for the task before aborting it
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a session waits for the channel close handshake
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Commands sent to the sync task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Drop the current session and bootstrap again right away
    Reconnect,
    /// Stop the sync task
    Shutdown,
}

/// Events emitted by the sync task
///
/// Best-effort: a consumer that falls behind loses events. Renderers should
/// read the models through [`Observers`] and use events as hints.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connection state changed
    ConnectionChanged(ConnectionState),
    /// A status push replaced the current status
    StatusUpdated(Status),
    /// A log push was added to the buffer
    LogReceived(LogEntry),
    /// A bootstrap or channel attempt failed
    Error(String),
}

/// Configuration for the sync task
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Push channel URL
    pub push_url: String,
    /// Delay between reconnect attempts
    pub retry_delay: Duration,
    /// Log entries requested on bootstrap
    pub log_count: usize,
    /// Log entries kept in memory
    pub log_capacity: usize,
    /// Capacity of the event channel; events beyond it are dropped
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_url: String::new(),
            retry_delay: Duration::from_secs(2),
            log_count: DEFAULT_LOG_COUNT,
            log_capacity: 1_000,
            event_capacity: 256,
        }
    }
}

impl SyncConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            push_url: config.push_url(),
            retry_delay: config.retry_delay(),
            log_count: config.log_count,
            log_capacity: config.log_capacity,
            ..Self::default()
        }
    }
}

/// Handle to the running sync task
///
/// Dropping the handle aborts the task; [`SyncHandle::teardown`] stops it
/// gracefully.
pub struct SyncHandle {
    command_tx: mpsc::Sender<SyncCommand>,
    observers: Observers,
    event_rx: Option<mpsc::Receiver<SyncEvent>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Spawn a sync task against the HTTP API and WebSocket channel
    /// described by `config`
    pub fn connect(config: &Config) -> SyncResult<Self> {
        let api = HttpApi::from_config(config)?;
        Ok(spawn_sync_task(
            SyncConfig::from_config(config),
            Arc::new(api),
            Arc::new(WebSocketConnector),
        ))
    }

    /// Current status; `None` until the first bootstrap
    pub fn status(&self) -> watch::Receiver<Option<Status>> {
        self.observers.status.clone()
    }

    /// Log buffer, newest first
    pub fn logs(&self) -> watch::Receiver<LogBuffer> {
        self.observers.logs.clone()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.observers.connection.clone()
    }

    /// Finer-grained state machine phase
    pub fn phase(&self) -> watch::Receiver<ChannelPhase> {
        self.observers.phase.clone()
    }

    pub fn observers(&self) -> Observers {
        self.observers.clone()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SyncEvent>> {
        self.event_rx.take()
    }

    /// Ask the task to drop its session and bootstrap again
    ///
    /// Returns `false` if the task is gone or busy with earlier commands.
    pub fn reconnect(&self) -> bool {
        self.task.is_some() && self.command_tx.try_send(SyncCommand::Reconnect).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the task and close any open channel
    ///
    /// Once this returns the models are no longer written. Calling it again
    /// does nothing.
    pub async fn teardown(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };

        let command_tx = self.command_tx.clone();
        let graceful = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            let _ = command_tx.send(SyncCommand::Shutdown).await;
            (&mut task).await
        })
        .await;

        if graceful.is_err() {
            warn!("sync task did not stop in time, aborting");
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn a sync task
///
/// The task starts in `Disconnected` and immediately attempts its first
/// bootstrap.
pub fn spawn_sync_task(
    config: SyncConfig,
    api: Arc<dyn StatusApi>,
    connector: Arc<dyn ChannelConnector>,
) -> SyncHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
    let state = LiveState::new(config.log_capacity);
    let observers = state.observers();

    let task = tokio::spawn(sync_task_loop(
        config,
        api,
        connector,
        state,
        command_rx,
        EventSink(event_tx),
    ));

    SyncHandle {
        command_tx,
        observers,
        event_rx: Some(event_rx),
        task: Some(task),
    }
}

/// Non-blocking event sender
///
/// A slow consumer loses events instead of stalling the sync task.
struct EventSink(mpsc::Sender<SyncEvent>);

impl EventSink {
    fn emit(&self, event: SyncEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.0.try_send(event) {
            warn!(?event, "event channel full, dropping event");
        }
    }
}

/// How a session ended
enum SessionEnd {
    Shutdown,
    Reconnect,
    Failed(SyncError),
}

/// Main sync task loop with reconnection
async fn sync_task_loop(
    config: SyncConfig,
    api: Arc<dyn StatusApi>,
    connector: Arc<dyn ChannelConnector>,
    state: LiveState,
    mut command_rx: mpsc::Receiver<SyncCommand>,
    events: EventSink,
) {
    loop {
        let end = run_session(
            &config,
            api.as_ref(),
            connector.as_ref(),
            &state,
            &mut command_rx,
            &events,
        )
        .await;

        match end {
            SessionEnd::Shutdown => break,
            SessionEnd::Reconnect => {
                info!("reconnect requested");
                continue;
            }
            SessionEnd::Failed(e) => {
                if e.is_transient() {
                    warn!(error = %e, "sync attempt failed, retrying in {:?}", config.retry_delay);
                } else {
                    error!(error = %e, "sync attempt failed, retrying in {:?}", config.retry_delay);
                }
                events.emit(SyncEvent::Error(e.to_string()));
            }
        }

        // Wait before reconnecting, but check for commands
        tokio::select! {
            _ = tokio::time::sleep(config.retry_delay) => {}
            cmd = command_rx.recv() => {
                match cmd {
                    Some(SyncCommand::Shutdown) | None => break,
                    Some(SyncCommand::Reconnect) => {}
                }
            }
        }
    }

    enter(&state, &events, ChannelPhase::Disconnected);
    debug!("sync task stopped");
}

/// One bootstrap + channel session, from Bootstrapping until it ends
async fn run_session(
    config: &SyncConfig,
    api: &dyn StatusApi,
    connector: &dyn ChannelConnector,
    state: &LiveState,
    command_rx: &mut mpsc::Receiver<SyncCommand>,
    events: &EventSink,
) -> SessionEnd {
    enter(state, events, ChannelPhase::Bootstrapping);

    let snapshot = tokio::select! {
        result = bootstrap(api, config.log_count) => result,
        cmd = command_rx.recv() => {
            enter(state, events, ChannelPhase::Disconnected);
            return command_end(cmd);
        }
    };
    let snapshot = match snapshot {
        Ok(snapshot) => snapshot,
        Err(e) => {
            enter(state, events, ChannelPhase::Disconnected);
            return SessionEnd::Failed(e);
        }
    };

    let opened = tokio::select! {
        result = connector.open(&config.push_url) => result,
        cmd = command_rx.recv() => {
            enter(state, events, ChannelPhase::Disconnected);
            return command_end(cmd);
        }
    };
    let mut channel = match opened {
        Ok(channel) => channel,
        Err(e) => {
            enter(state, events, ChannelPhase::Disconnected);
            return SessionEnd::Failed(e);
        }
    };

    // Models and connection state change together once the channel is up
    state.apply_snapshot(snapshot.status, snapshot.logs);
    enter(state, events, ChannelPhase::Connected);
    info!(url = %config.push_url, "push channel connected");

    let end = receive_loop(channel.as_mut(), &config.push_url, state, command_rx, events).await;

    // Observers see the loss before a slow close handshake
    enter(state, events, ChannelPhase::Disconnected);
    if tokio::time::timeout(CLOSE_TIMEOUT, channel.close()).await.is_err() {
        warn!(url = %config.push_url, "push channel close timed out");
    }
    end
}

/// Dispatch frames until the channel fails or a command arrives
async fn receive_loop(
    channel: &mut dyn PushChannel,
    url: &str,
    state: &LiveState,
    command_rx: &mut mpsc::Receiver<SyncCommand>,
    events: &EventSink,
) -> SessionEnd {
    loop {
        tokio::select! {
            cmd = command_rx.recv() => return command_end(cmd),
            frame = channel.next_frame() => {
                match frame {
                    Some(Ok(text)) => match dispatch(state, &text) {
                        DispatchOutcome::StatusReplaced(status) => {
                            events.emit(SyncEvent::StatusUpdated(status));
                        }
                        DispatchOutcome::LogPrepended(entry) => {
                            events.emit(SyncEvent::LogReceived(entry));
                        }
                        DispatchOutcome::Dropped => {}
                    },
                    Some(Err(e)) => return SessionEnd::Failed(e),
                    None => {
                        return SessionEnd::Failed(SyncError::ChannelClosed {
                            url: url.to_string(),
                        });
                    }
                }
            }
        }
    }
}

fn command_end(cmd: Option<SyncCommand>) -> SessionEnd {
    match cmd {
        Some(SyncCommand::Reconnect) => SessionEnd::Reconnect,
        // Handle dropped
        Some(SyncCommand::Shutdown) | None => SessionEnd::Shutdown,
    }
}

fn enter(state: &LiveState, events: &EventSink, phase: ChannelPhase) {
    if state.phase() != phase {
        debug!(?phase, "sync phase");
    }
    if state.set_phase(phase) {
        events.emit(SyncEvent::ConnectionChanged(phase.connection_state()));
    }
}
