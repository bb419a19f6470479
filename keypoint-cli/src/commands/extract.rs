//! Extract command implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use keypoint_core::{
    ClientConfig, DetectionMethod, FeatureExtractor, FileSource, MemoryPreviewStore, PickedFile,
    ServiceClient, SessionState,
};
use tracing::{debug, info};

use crate::utils::{format_size, print_result};

/// Execute the extract command.
pub async fn execute(
    config: ClientConfig,
    file: &Path,
    method: DetectionMethod,
    output: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let picked = PickedFile::from_path(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    info!(path = %file.display(), bytes = picked.size(), "Read file");

    let timeout = config.timeout;
    let client = Arc::new(ServiceClient::new(config).context("Failed to create HTTP client")?);
    let tool = FeatureExtractor::new(
        client.clone(),
        Arc::new(MemoryPreviewStore::new()),
        timeout,
    );

    let selection = tool
        .select_file(FileSource::ManualPick(Some(picked)))
        .context("Image rejected")?;
    tool.set_method(method);

    if !quiet && !json {
        eprintln!(
            "{} {} ({}) with {}",
            "Extracting".cyan(),
            selection.display_name,
            format_size(selection.size_bytes),
            method
        );
    }

    let outcome = tool.submit().await;
    debug!(?outcome, "Submission finished");

    let result = match tool.current_state() {
        SessionState::Succeeded(result) => result,
        SessionState::Failed(failure) => {
            return Err(anyhow::Error::new(failure).context("Extraction failed"));
        }
        other => bail!("Extraction did not complete (state: {})", other.name()),
    };

    if let Some(path) = output {
        let bytes = client
            .download(&result.image_url)
            .await
            .context("Failed to download annotated image")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write annotated image: {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Annotated image saved");
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{rendered}");
    } else if !quiet {
        print_result(&result);
        if let Some(path) = output {
            println!();
            println!("   {} {}", "Saved:".dimmed(), path.display());
        }
    }

    Ok(())
}
