//! Catalog listing

use anyhow::{Context, Result};
use cadence_choreography::ChoreographyConfig;
use cadence_core::MoveInfo;
use clap::Args;

#[derive(Args)]
pub struct MovesCommand {
    /// Print the catalog and parameter configuration as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: MovesCommand, config: &ChoreographyConfig) -> Result<()> {
    let catalog = config.load_catalog().context("failed to load move catalog")?;
    let moves = catalog.list_moves();

    if cmd.json {
        let listing = cadence_choreography::MoveListing {
            moves,
            move_params_config: catalog.move_params_config().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!(
        "{:<16} {:>6} {:>4} {:<20} {:<8} {:>12} {:<14}",
        "move", "slices", "ext", "entrance", "exit", "seconds", "subsystems"
    );
    for info in &moves {
        println!("{}", row(info));
    }
    println!("{} moves", moves.len());
    Ok(())
}

fn row(info: &MoveInfo) -> String {
    format!(
        "{:<16} {:>6} {:>4} {:<20} {:<8} {:>12} {:<14}",
        info.name,
        info.move_length_slices,
        if info.is_extendable { "yes" } else { "no" },
        info.entrance_list(),
        info.exit_state.to_string(),
        format!("{}-{}", info.min_time, info.max_time),
        info.controls.to_string(),
    )
}
