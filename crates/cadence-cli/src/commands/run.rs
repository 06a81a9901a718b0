//! Dry-run playback against the wall clock
//!
//! Uploads the file into a fresh in-memory store, executes it under a lease
//! the CLI grants itself, and logs every activation instead of moving a robot.
//! Ctrl-C aborts the session.

use anyhow::{bail, Context, Result};
use cadence_choreography::{
    ChoreographyConfig, ChoreographyService, ExecuteRequest, SequenceStore, SessionReport,
};
use cadence_core::{ClockEffects, ExecuteStatus, LeaseToken};
use cadence_effects::{DryRunMotionController, StaticLeaseArbiter, SystemClockHandler};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::common;

#[derive(Args)]
pub struct RunCommand {
    /// JSON sequence file
    pub file: PathBuf,

    /// Clamp correctable bounds violations instead of rejecting them
    #[arg(long)]
    pub non_strict: bool,

    /// Slice of the sequence that plays at the start time
    #[arg(long, default_value = "0")]
    pub start_slice: u64,

    /// Delay before the start time, in milliseconds
    #[arg(long, default_value = "500")]
    pub delay_ms: u64,

    /// Resource named by the self-granted lease
    #[arg(long, default_value = "body")]
    pub lease_resource: String,

    /// Epoch of the self-granted lease
    #[arg(long, default_value = "cli")]
    pub lease_epoch: String,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(cmd: RunCommand, config: &ChoreographyConfig) -> Result<()> {
    let catalog = config.load_catalog().context("failed to load move catalog")?;
    let lease = LeaseToken::new(cmd.lease_resource.clone(), cmd.lease_epoch.clone(), vec![0]);
    let clock = Arc::new(SystemClockHandler::new());
    let service = ChoreographyService::from_config(
        config,
        catalog,
        Arc::new(SequenceStore::new()),
        clock.clone(),
        Arc::new(DryRunMotionController::new()),
        Arc::new(StaticLeaseArbiter::with_lease(lease.clone())),
    );

    let record = common::read_sequence(&cmd.file).await?;
    let name = record.name.clone();
    let upload = service.upload(record, cmd.non_strict || config.validation.non_strict_by_default);
    if !upload.accepted {
        println!("rejected {}", cmd.file.display());
        common::print_diagnostics(&upload.diagnostics);
        bail!("{} violation(s)", upload.diagnostics.len());
    }
    common::print_warnings(&upload.warnings);

    let start_time = clock.now().await + Duration::from_millis(cmd.delay_ms);
    let response = service
        .execute(ExecuteRequest {
            sequence_name: name,
            start_time,
            start_slice: cmd.start_slice,
            lease: lease.clone(),
        })
        .await;
    let session_id = match (response.status, response.session_id) {
        (ExecuteStatus::Ok, Some(id)) => id,
        (status, _) => bail!(
            "execute failed with {status}: {}",
            response.message.unwrap_or_default()
        ),
    };
    info!(%session_id, %start_time, "session armed");

    let report = tokio::select! {
        report = service.wait_for_completion(session_id) => report,
        interrupted = tokio::signal::ctrl_c() => {
            if let Err(err) = interrupted {
                warn!(error = %err, "failed to listen for ctrl-c");
            }
            service.abort(lease).await;
            service.scheduler().report(session_id)
        }
    };
    let report = report.context("session report is unavailable")?;
    print_report(&report, cmd.json)?;

    if report.execute_status != ExecuteStatus::Ok {
        bail!("session ended with {}", report.status);
    }
    Ok(())
}

fn print_report(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("session {} of '{}': {}", report.session_id, report.sequence, report.status);
    for record in &report.dispatched {
        println!(
            "  {:>4}..{:<4} {:<16} at {} until {}",
            record.start_slice, record.end_slice, record.move_type, record.dispatched_at, record.deadline
        );
    }
    if !report.skipped.is_empty() {
        println!("  skipped moves: {:?}", report.skipped);
    }
    common::print_warnings(&report.posture_warnings);
    Ok(())
}
