//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use cspanel_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "server_url": config.server_url,
                    "ws_url": config.ws_url,
                    "push_url": config.push_url(),
                    "retry_delay_ms": config.retry_delay_ms,
                    "request_timeout_ms": config.request_timeout_ms,
                    "log_count": config.log_count,
                    "log_capacity": config.log_capacity
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.server_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  server_url:         {}", config.server_url);
            println!(
                "  ws_url:             {}",
                config.ws_url.as_deref().unwrap_or("(derived)")
            );
            println!("  retry_delay_ms:     {}", config.retry_delay_ms);
            println!("  request_timeout_ms: {}", config.request_timeout_ms);
            println!("  log_count:          {}", config.log_count);
            println!("  log_capacity:       {}", config.log_capacity);
            println!();
            println!("Push channel: {}", config.push_url());
            println!("Config file:  {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "server_url" => {
            if value.is_empty() {
                bail!("server_url cannot be empty");
            }
            config.server_url = value.to_string();
        }
        "ws_url" => {
            config.ws_url = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "retry_delay_ms" => {
            config.retry_delay_ms = value
                .parse()
                .context("Invalid value for retry_delay_ms. Use a number of milliseconds.")?;
        }
        "request_timeout_ms" => {
            config.request_timeout_ms = value
                .parse()
                .context("Invalid value for request_timeout_ms. Use a number of milliseconds.")?;
        }
        "log_count" => {
            let count: usize = value
                .parse()
                .context("Invalid value for log_count. Use a positive number.")?;
            if count == 0 {
                bail!("Invalid value for log_count. Use a positive number.");
            }
            config.log_count = count;
        }
        "log_capacity" => {
            config.log_capacity = value
                .parse()
                .context("Invalid value for log_capacity. Use a positive number.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: server_url, ws_url, retry_delay_ms, request_timeout_ms, \
                 log_count, log_capacity",
                key
            );
        }
    }
    Ok(())
}
