//! Tools command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use keypoint_core::{ClientConfig, ServiceClient, ToolStatus};
use tracing::info;

/// Execute the tools command.
pub async fn execute(config: ClientConfig, json: bool, quiet: bool) -> Result<()> {
    let client = ServiceClient::new(config).context("Failed to create HTTP client")?;
    let tools = client
        .list_tools()
        .await
        .context("Failed to list tools")?;

    info!(count = tools.len(), "Fetched tool catalogue");

    if json {
        let rendered =
            serde_json::to_string_pretty(&tools).context("Failed to serialize tools")?;
        println!("{rendered}");
        return Ok(());
    }

    for tool in &tools {
        if quiet {
            println!("{}", tool.id);
            continue;
        }

        let status = match tool.status {
            ToolStatus::Active => tool.status.to_string().green(),
            ToolStatus::ComingSoon => tool.status.to_string().yellow(),
            ToolStatus::Unknown => tool.status.to_string().dimmed(),
        };
        println!("{} [{}]", tool.name.bold(), status);
        println!("   {}", tool.description);
        if let Some(methods) = &tool.methods {
            println!("   {} {}", "Methods:".dimmed(), methods.join(", "));
        }
    }

    Ok(())
}
