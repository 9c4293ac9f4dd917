//! Data models for the control panel
//!
//! Defines the server status snapshot and log entries as they appear on the
//! wire, both in bootstrap responses and in push messages.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of the game server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerState {
    Idle,
    ServerStarting,
    ServerStarted,
    ServerStopping,
    SteamcmdUpdating,
    PluginInstalling,
    PluginUninstalling,
    /// A state this client does not know about yet
    #[serde(other)]
    Unknown,
}

impl ServerState {
    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Idle => "idle",
            ServerState::ServerStarting => "server-starting",
            ServerState::ServerStarted => "server-started",
            ServerState::ServerStopping => "server-stopping",
            ServerState::SteamcmdUpdating => "steamcmd-updating",
            ServerState::PluginInstalling => "plugin-installing",
            ServerState::PluginUninstalling => "plugin-uninstalling",
            ServerState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the single live server instance
///
/// Always complete: every field except `is_game_server_installed` is
/// required when decoding, so a partial payload never becomes a `Status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub state: ServerState,
    pub hostname: String,
    pub map: String,
    pub player_count: u32,
    pub max_player_count: u32,
    pub ip: String,
    pub port: String,
    pub password: String,
    /// Only reported by newer servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_game_server_installed: Option<bool>,
}

impl Status {
    /// Whether the server is doing anything other than idling
    pub fn is_busy(&self) -> bool {
        self.state != ServerState::Idle
    }

    /// `steam://` URL that joins the server directly
    pub fn connection_url(&self) -> String {
        let mut url = format!("steam://connect/{}:{}", self.ip, self.port);
        if !self.password.is_empty() {
            url.push('/');
            url.push_str(&self.password);
        }
        url
    }

    /// Console command that joins the server
    pub fn connection_string(&self) -> String {
        let mut connect = format!("connect {}:{}", self.ip, self.port);
        if !self.password.is_empty() {
            connect.push_str("; password ");
            connect.push_str(&self.password);
        }
        connect
    }
}

/// One line of the server's user log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp as sent by the server
    pub timestamp: String,
    pub log_type: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(
        timestamp: impl Into<String>,
        log_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            log_type: log_type.into(),
            message: message.into(),
        }
    }

    /// Parse the timestamp as RFC 3339, if it is one
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_status() -> Status {
        Status {
            state: ServerState::Idle,
            hostname: "srv".to_string(),
            map: "de_dust2".to_string(),
            player_count: 0,
            max_player_count: 10,
            ip: "10.0.0.5".to_string(),
            port: "27015".to_string(),
            password: String::new(),
            is_game_server_installed: None,
        }
    }

    #[test]
    fn test_state_wire_names() {
        let state: ServerState = serde_json::from_str(r#""server-starting""#).unwrap();
        assert_eq!(state, ServerState::ServerStarting);

        let state: ServerState = serde_json::from_str(r#""plugin-uninstalling""#).unwrap();
        assert_eq!(state, ServerState::PluginUninstalling);
        assert_eq!(state.to_string(), "plugin-uninstalling");

        assert_eq!(
            serde_json::to_string(&ServerState::SteamcmdUpdating).unwrap(),
            r#""steamcmd-updating""#
        );
    }

    #[test]
    fn test_unknown_state_is_tolerated() {
        let state: ServerState = serde_json::from_str(r#""server-exploding""#).unwrap();
        assert_eq!(state, ServerState::Unknown);
    }

    #[test]
    fn test_status_decoding_requires_all_fields() {
        let full = r#"{"state":"idle","hostname":"srv","player_count":0,"max_player_count":10,
                       "map":"de_dust2","ip":"","port":"","password":""}"#;
        let status: Status = serde_json::from_str(full).unwrap();
        assert_eq!(status.hostname, "srv");
        assert_eq!(status.is_game_server_installed, None);

        let partial = r#"{"state":"idle","hostname":"srv"}"#;
        assert!(serde_json::from_str::<Status>(partial).is_err());
    }

    #[test]
    fn test_installed_flag() {
        let json = r#"{"state":"idle","hostname":"srv","player_count":0,"max_player_count":10,
                       "map":"de_dust2","ip":"","port":"","password":"",
                       "is_game_server_installed":false}"#;
        let status: Status = serde_json::from_str(json).unwrap();
        assert_eq!(status.is_game_server_installed, Some(false));
    }

    #[test]
    fn test_is_busy() {
        let mut status = sample_status();
        assert!(!status.is_busy());

        status.state = ServerState::SteamcmdUpdating;
        assert!(status.is_busy());
    }

    #[test]
    fn test_connection_strings() {
        let mut status = sample_status();
        assert_eq!(status.connection_url(), "steam://connect/10.0.0.5:27015");
        assert_eq!(status.connection_string(), "connect 10.0.0.5:27015");

        status.password = "hunter2".to_string();
        assert_eq!(
            status.connection_url(),
            "steam://connect/10.0.0.5:27015/hunter2"
        );
        assert_eq!(
            status.connection_string(),
            "connect 10.0.0.5:27015; password hunter2"
        );
    }

    #[test]
    fn test_log_entry_timestamp() {
        let entry = LogEntry::new("2024-08-01T12:30:00Z", "info", "server started");
        assert!(entry.parsed_timestamp().is_some());

        let opaque = LogEntry::new("T1", "info", "started");
        assert!(opaque.parsed_timestamp().is_none());
    }
}
