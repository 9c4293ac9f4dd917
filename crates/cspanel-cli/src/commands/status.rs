//! Status command handler

use anyhow::{Context, Result};

use cspanel_core::{Config, HttpApi, StatusApi};

use crate::output::Output;

/// Fetch and show the current server status
pub async fn show(config: &Config, output: &Output) -> Result<()> {
    let api = HttpApi::from_config(config)?;
    let status = api
        .get_status()
        .await
        .with_context(|| format!("Failed to fetch status from {}", api.base_url()))?;

    output.print_status(&status)
}
