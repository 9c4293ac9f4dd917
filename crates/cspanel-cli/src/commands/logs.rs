//! Logs command handler

use anyhow::{Context, Result};

use cspanel_core::{Config, HttpApi, StatusApi};

use crate::output::Output;

/// Fetch and show the most recent log entries
pub async fn show(config: &Config, count: Option<usize>, output: &Output) -> Result<()> {
    let count = count.unwrap_or(config.log_count);
    let api = HttpApi::from_config(config)?;
    let logs = api
        .get_logs(count)
        .await
        .with_context(|| format!("Failed to fetch logs from {}", api.base_url()))?;

    output.print_logs(&logs)
}
