//! Offline validation of sequence files

use anyhow::{bail, Context, Result};
use cadence_choreography::{ChoreographyConfig, SequenceValidator};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use super::common;

#[derive(Args)]
pub struct ValidateCommand {
    /// JSON sequence file
    pub file: PathBuf,

    /// Reject anything that would need correcting
    #[arg(long, conflicts_with = "non_strict")]
    pub strict: bool,

    /// Clamp correctable bounds violations instead of rejecting them
    #[arg(long)]
    pub non_strict: bool,

    /// Print the corrected sequence as JSON when accepted
    #[arg(long)]
    pub print: bool,
}

pub async fn run(cmd: ValidateCommand, config: &ChoreographyConfig) -> Result<()> {
    let catalog = config.load_catalog().context("failed to load move catalog")?;
    let validator =
        SequenceValidator::new(Arc::new(catalog)).with_options(config.validation_options());
    let record = common::read_sequence(&cmd.file).await?;
    let non_strict = common::non_strict(cmd.strict, cmd.non_strict, config);

    match validator.validate_record(record, non_strict) {
        Ok(accepted) => {
            println!(
                "accepted '{}' ({} moves, {} slices)",
                accepted.sequence.name,
                accepted.sequence.moves.len(),
                accepted.sequence.total_slices()
            );
            common::print_warnings(&accepted.warnings);
            if cmd.print {
                println!("{}", serde_json::to_string_pretty(&accepted.sequence)?);
            }
            Ok(())
        }
        Err(rejection) => {
            println!("rejected {}", cmd.file.display());
            common::print_diagnostics(&rejection.diagnostics);
            bail!("{} violation(s)", rejection.diagnostics.len())
        }
    }
}
