//! Operator CLI for Cadence
//!
//! Inspect the move catalog, validate sequence files and rehearse them against
//! the wall clock with a dry-run motion controller.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{
    common,
    moves::{self, MovesCommand},
    run::{self, RunCommand},
    validate::{self, ValidateCommand},
};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - Robot Choreography Validation and Playback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = cadence_choreography::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List the move catalog
    Moves(MovesCommand),

    /// Validate a sequence file without executing it
    Validate(ValidateCommand),

    /// Validate a sequence file and play it with the dry-run controller
    Run(RunCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = common::load_config(&cli.config)?;

    match cli.command {
        Commands::Moves(cmd) => moves::run(cmd, &config)?,
        Commands::Validate(cmd) => validate::run(cmd, &config).await?,
        Commands::Run(cmd) => run::run(cmd, &config).await?,
    }

    Ok(())
}
