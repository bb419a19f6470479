//! Health command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use keypoint_core::{ClientConfig, GatewayError, ServiceClient};

/// Execute the health command.
pub async fn execute(config: ClientConfig, quiet: bool) -> Result<()> {
    let base_url = config.base_url.clone();
    let client = ServiceClient::new(config).context("Failed to create HTTP client")?;
    let report = client
        .health()
        .await
        .with_context(|| format!("Health check against {base_url} failed"))?;

    if !report.is_healthy() {
        let reason = format!("service reports status '{}'", report.status);
        return Err(GatewayError::ServiceUnavailable(reason).into());
    }

    if !quiet {
        println!("{} {}", "Service healthy:".green().bold(), base_url);
        if let Some(timestamp) = report.timestamp {
            println!("   {} {}", "Server time:".dimmed(), timestamp);
        }
        if !report.available_tools.is_empty() {
            println!(
                "   {} {}",
                "Tools:".dimmed(),
                report.available_tools.join(", ")
            );
        }
    }

    Ok(())
}
