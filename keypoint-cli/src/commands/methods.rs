//! Methods command implementation.

use anyhow::Result;
use colored::Colorize;
use keypoint_core::DetectionMethod;

/// Execute the methods command.
pub fn execute(quiet: bool) -> Result<()> {
    for method in DetectionMethod::ALL {
        if quiet {
            println!("{method}");
            continue;
        }

        let descriptor = if method.has_binary_descriptor() {
            "binary"
        } else {
            "float"
        };
        println!(
            "{:<6} {} {}",
            method.as_str().bold(),
            method.description(),
            format!("({descriptor} descriptors)").dimmed()
        );
    }

    Ok(())
}
