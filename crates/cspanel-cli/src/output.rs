//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use cspanel_core::{ConnectionState, LogEntry, Status};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the server status
    pub fn print_status(&self, status: &Status) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Server:      {}", status.hostname);
                println!("State:       {}", status.state);
                println!("Map:         {}", status.map);
                println!(
                    "Players:     {}/{}",
                    status.player_count, status.max_player_count
                );
                if let Some(installed) = status.is_game_server_installed {
                    println!("Installed:   {}", if installed { "yes" } else { "no" });
                }
                if !status.ip.is_empty() {
                    println!("Connect:     {}", status.connection_string());
                    println!("Steam URL:   {}", status.connection_url());
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(status)?);
            }
            OutputFormat::Quiet => {
                println!("{}", status.state);
            }
        }
        Ok(())
    }

    /// Print a list of log entries, newest first
    pub fn print_logs(&self, logs: &[LogEntry]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if logs.is_empty() {
                    println!("No log entries.");
                    return Ok(());
                }
                for entry in logs {
                    println!("{}", format_log_line(entry));
                }
                println!("\n{} entr{}", logs.len(), if logs.len() == 1 { "y" } else { "ies" });
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(logs)?);
            }
            OutputFormat::Quiet => {
                for entry in logs {
                    println!("{}", entry.message);
                }
            }
        }
        Ok(())
    }

    /// Print one streamed log entry
    pub fn print_log_entry(&self, entry: &LogEntry) -> Result<()> {
        match self.format {
            OutputFormat::Human => println!("{}", format_log_line(entry)),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"type": "log", "message": serde_json::to_value(entry)?})
                );
            }
            OutputFormat::Quiet => println!("{}", entry.message),
        }
        Ok(())
    }

    /// Print a streamed status change
    pub fn print_status_update(&self, status: &Status) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "* {} | {} | {} | {}/{} players",
                    status.state,
                    truncate(&status.hostname, 30),
                    status.map,
                    status.player_count,
                    status.max_player_count
                );
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"type": "status", "message": serde_json::to_value(status)?})
                );
            }
            OutputFormat::Quiet => {}
        }
        Ok(())
    }

    /// Print a connection state change
    pub fn print_connection(&self, state: ConnectionState) {
        match self.format {
            OutputFormat::Human => match state {
                ConnectionState::Connected => println!("-- connected --"),
                ConnectionState::Disconnected => println!("-- disconnected, reconnecting --"),
            },
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"type": "connection", "state": state.to_string()})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Format a log entry as `[time] type: message`
///
/// RFC 3339 timestamps are shown in local time; anything else verbatim.
fn format_log_line(entry: &LogEntry) -> String {
    let timestamp = entry
        .parsed_timestamp()
        .map(|ts| {
            ts.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| entry.timestamp.clone());
    format!("[{}] {}: {}", timestamp, entry.log_type, truncate_line(&entry.message, 200))
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
