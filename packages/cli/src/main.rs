#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the peacewatch analysis toolchain.
//!
//! ```text
//! peacewatch analyze --incidents incidents.json [--endpoint URL] [--timeout-secs 30]
//! peacewatch trends --history history.json --prediction prediction.json
//! peacewatch serve
//! ```
//!
//! Results are printed to stdout as JSON. Warnings go to stderr.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::AnalyzeOptions;

#[derive(Parser)]
#[command(
    name = "peacewatch",
    about = "Incident pattern detection and trend summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect temporal, spatial, and actor patterns in a set of incidents
    Analyze {
        /// JSON file containing an array of incidents
        #[arg(long)]
        incidents: PathBuf,
        /// Analysis server base URL (defaults to `ANALYSIS_ENDPOINT`)
        #[arg(long)]
        endpoint: Option<String>,
        /// Seconds to wait for the analysis server
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Incident category to focus on
        #[arg(long)]
        category: Option<String>,
        /// Region to focus on
        #[arg(long)]
        region: Option<String>,
        /// Timeframe label, e.g. "last 90 days"
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Merge historical counts with a forecast into a chart series
    Trends {
        /// JSON file containing monthly history points
        #[arg(long)]
        history: PathBuf,
        /// JSON file containing monthly prediction points
        #[arg(long)]
        prediction: PathBuf,
    },
    /// Start the analysis API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            incidents,
            endpoint,
            timeout_secs,
            category,
            region,
            timeframe,
        } => {
            let options = AnalyzeOptions {
                endpoint,
                timeout_secs,
                category,
                region,
                timeframe,
            };
            let outcome = commands::analyze(&incidents, options).await?;

            for warning in &outcome.warnings {
                eprintln!("Warning: {warning}");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Trends {
            history,
            prediction,
        } => {
            let summary = commands::trends(&history, &prediction)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Serve => {
            // actix-web runs its own system; keep it off the tokio worker.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(peacewatch_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}
