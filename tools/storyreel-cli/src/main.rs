//! Storyreel CLI: command-line interface for building vertical short videos.
//!
//! Usage:
//!   storyreel render <PROJECT> [DIRS...]    Assemble and encode a video
//!   storyreel plan <PROJECT> [DIRS...]      Print the resolved timeline as JSON
//!   storyreel validate <PROJECT> [DIRS...]  Check documents and referenced assets
//!   storyreel check                         Check renderer availability

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use storyreel_common::config::EngineConfig;

mod commands;

use commands::ReelInputs;

#[derive(Parser)]
#[command(
    name = "storyreel",
    about = "Turn a scene list into a captioned vertical short video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine config file (defaults to the standard config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the project and encode it to video
    Render {
        #[command(flatten)]
        inputs: ReelInputs,

        /// Render every subtitle cue instead of only the first per scene
        #[arg(long)]
        all_cues: bool,

        /// Abort encoding after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Also write an SRT caption sidecar next to the video
        #[arg(long)]
        srt: bool,
    },

    /// Assemble the project and print the resolved timeline without encoding
    Plan {
        #[command(flatten)]
        inputs: ReelInputs,

        /// Resolve every subtitle cue instead of only the first per scene
        #[arg(long)]
        all_cues: bool,

        /// Write the timeline JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate project and style documents and report missing assets
    Validate {
        #[command(flatten)]
        inputs: ReelInputs,
    },

    /// Check that the configured ffmpeg and ffprobe are usable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    storyreel_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            inputs,
            all_cues,
            timeout,
            srt,
        } => commands::render::run(inputs, config, all_cues, timeout, srt).await,
        Commands::Plan {
            inputs,
            all_cues,
            output,
        } => commands::plan::run(inputs, config, all_cues, output),
        Commands::Validate { inputs } => commands::validate::run(inputs, config),
        Commands::Check => commands::check::run(config),
    }
}
