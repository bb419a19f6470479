//! Keypoint CLI - keypoint feature extraction from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use keypoint_core::config::{API_TIMEOUT_ENV, API_URL_ENV};
use keypoint_core::{ClientConfig, DetectionMethod};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (bad arguments or configuration)
  65  Image rejected (not an image, too large, refused by the service)
  66  Input file not found or unreadable
  69  Extraction service unavailable, failing (5xx) or timed out
  74  I/O error (cannot write output file)";

#[derive(Parser)]
#[command(name = "keypoint")]
#[command(author, version, about = "Keypoint feature extraction client", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the extraction service
    #[arg(long, global = true, env = API_URL_ENV, value_name = "URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = API_TIMEOUT_ENV, value_name = "SECS")]
    timeout: Option<String>,

    /// Suppress everything but errors and machine-readable output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract keypoints from an image
    Extract {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Detection method
        #[arg(short, long, default_value_t = DetectionMethod::Sift)]
        method: DetectionMethod,

        /// Save the annotated image to this path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available detection methods
    Methods,

    /// List the tools offered by the service
    Tools {
        /// Print the catalogue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the service is up
    Health,
}

impl Cli {
    /// Flags win over the environment; clap has already folded the
    /// environment into the flags, so only they are consulted.
    fn client_config(&self) -> Result<ClientConfig, keypoint_core::ConfigError> {
        ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => self.api_url.clone(),
            API_TIMEOUT_ENV => self.timeout.clone(),
            _ => None,
        })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match &cli.command {
        Commands::Methods => commands::methods::execute(quiet),
        Commands::Extract {
            file,
            method,
            output,
            json,
        } => {
            let config = cli.client_config()?;
            commands::extract::execute(config, file, *method, output.as_deref(), *json, quiet)
                .await
        }
        Commands::Tools { json } => {
            let config = cli.client_config()?;
            commands::tools::execute(config, *json, quiet).await
        }
        Commands::Health => {
            let config = cli.client_config()?;
            commands::health::execute(config, quiet).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(exit_codes::USAGE_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let exit = exit_codes::Exit::from_anyhow(&err);
            if let Some(message) = &exit.message {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            ExitCode::from(exit.code)
        }
    }
}
