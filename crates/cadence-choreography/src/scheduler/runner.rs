//! Dispatch loop of one execution session
//!
//! A single task per session owns all writes to the session's progress. Each
//! tick it:
//!
//! 1. honours a pending abort,
//! 2. drains lease revocation notices,
//! 3. polls the motion controller for faults,
//! 4. re-validates the lease through the gate (always on the first running
//!    tick, afterwards as the [`LeaseCheckPolicy`] says),
//! 5. dispatches every move whose slice range has become current,
//!
//! and then sleeps until the next slice boundary (or the configured tick cap),
//! waking early for aborts and revocations. Aborts and notices are checked
//! again before every activation, so a slow controller cannot carry the rest
//! of a batch past a stop.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use cadence_core::{
    ClockEffects, FaultReason, LeaseRevocation, MotionControllerEffects, MoveCommand,
    PlaybackStatus, Subsystem, Timestamp, TransitionState,
};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::plan::{PlannedMove, PlaybackPlan};
use super::session::{DispatchRecord, SessionReport, SessionShared};
use super::{LeaseCheckPolicy, SchedulerConfig};
use crate::lease_gate::LeaseGate;

/// Everything a dispatch task needs, owned so the task is `'static`
pub(crate) struct SessionContext {
    pub shared: Arc<SessionShared>,
    pub plan: Arc<PlaybackPlan>,
    pub clock: Arc<dyn ClockEffects>,
    pub motion: Arc<dyn MotionControllerEffects>,
    pub gate: Arc<LeaseGate>,
    pub config: SchedulerConfig,
    pub history: Arc<Mutex<VecDeque<SessionReport>>>,
    /// Receiver subscribed before the lease was admitted
    pub revocations: Option<broadcast::Receiver<LeaseRevocation>>,
}

enum Stop {
    Completed,
    Aborted,
    Faulted(FaultReason),
}

enum Wake {
    Tick,
    Stop(Stop),
}

struct Cursor {
    next: usize,
    posture: BTreeMap<Subsystem, TransitionState>,
}

pub(crate) async fn run(mut ctx: SessionContext) -> SessionReport {
    let shared = Arc::clone(&ctx.shared);
    let mut revocations = ctx.revocations.take();
    let mut lease_confirmed = false;
    let mut cursor = Cursor {
        next: 0,
        posture: BTreeMap::new(),
    };

    debug!(
        session_id = %shared.session_id,
        sequence = %shared.sequence,
        start_time = %shared.start_time,
        start_slice = shared.start_slice,
        "session armed"
    );

    let stop = loop {
        if shared.abort.is_requested() {
            break Stop::Aborted;
        }
        if let Some(notice) = drain_revocations(&mut revocations, &shared) {
            break lease_fault(notice.reason);
        }

        let now = ctx.clock.now().await;
        if now < shared.start_time {
            let wake_at = cap(&ctx.config, now, shared.start_time);
            match wait_until(&ctx, &mut revocations, wake_at).await {
                Wake::Tick => continue,
                Wake::Stop(stop) => break stop,
            }
        }

        if shared.status() == PlaybackStatus::Armed {
            shared.set_status(PlaybackStatus::Running);
            info!(session_id = %shared.session_id, sequence = %shared.sequence, "session running");
        }

        if let Some(fault) = ctx.motion.poll_fault(shared.session_id).await {
            break Stop::Faulted(FaultReason::RobotCommandIssues {
                message: fault.to_string(),
            });
        }

        let check_lease = !lease_confirmed
            || match ctx.config.lease_check {
                LeaseCheckPolicy::EveryTick => true,
                LeaseCheckPolicy::OnRevocation => revocations.is_none(),
            };
        if check_lease {
            if let Err(denied) = ctx.gate.admit(&shared.lease).await {
                break lease_fault(denied.to_string());
            }
            lease_confirmed = true;
        }

        let slice = ctx.plan.slice_at(shared.start_time, shared.start_slice, now);
        shared.progress.lock().current_slice = Some(slice);

        if let Err(stop) = dispatch_due(&ctx, &mut cursor, &mut revocations, slice, now).await {
            break stop;
        }

        if slice >= ctx.plan.total_slices && cursor.next >= ctx.plan.entries.len() {
            break Stop::Completed;
        }

        let boundary = ctx
            .plan
            .instant_of(shared.start_time, shared.start_slice, slice + 1);
        let wake_at = cap(&ctx.config, now, boundary);
        if let Wake::Stop(stop) = wait_until(&ctx, &mut revocations, wake_at).await {
            break stop;
        }
    };

    finish(&ctx, stop).await
}

/// Activate every move that has become current by `slice`.
///
/// Stops before the next activation once an abort is requested or the lease
/// is revoked, even partway through a batch.
async fn dispatch_due(
    ctx: &SessionContext,
    cursor: &mut Cursor,
    revocations: &mut Option<broadcast::Receiver<LeaseRevocation>>,
    slice: u64,
    now: Timestamp,
) -> Result<(), Stop> {
    let shared = &ctx.shared;
    while let Some(entry) = ctx.plan.entries.get(cursor.next) {
        if entry.start_slice() > slice {
            break;
        }
        if shared.abort.is_requested() {
            return Err(Stop::Aborted);
        }
        if let Some(notice) = drain_revocations(revocations, shared) {
            return Err(lease_fault(notice.reason));
        }
        cursor.next += 1;

        if entry.end_slice() <= slice {
            debug!(
                session_id = %shared.session_id,
                move_index = entry.index,
                move_type = %entry.params.type_name,
                "move already passed; skipping"
            );
            shared.progress.lock().skipped.push(entry.index);
            continue;
        }

        track_posture(shared, cursor, entry);

        let deadline = ctx
            .plan
            .instant_of(shared.start_time, shared.start_slice, entry.end_slice());
        let command = MoveCommand {
            session_id: shared.session_id,
            sequence: shared.sequence.clone(),
            move_index: entry.index,
            move_type: entry.params.type_name.clone(),
            payload: entry.params.payload.clone(),
            start_slice: entry.start_slice(),
            end_slice: entry.end_slice(),
            dispatched_at: now,
            deadline,
        };

        debug!(
            session_id = %shared.session_id,
            move_type = %command.move_type,
            slice,
            deadline = %deadline,
            "dispatching move"
        );
        if let Err(err) = ctx.motion.activate(command).await {
            warn!(session_id = %shared.session_id, error = %err, "motion controller refused move");
            return Err(Stop::Faulted(FaultReason::RobotCommandIssues {
                message: err.to_string(),
            }));
        }

        shared.progress.lock().dispatched.push(DispatchRecord {
            move_index: entry.index,
            move_type: entry.params.type_name.clone(),
            start_slice: entry.start_slice(),
            end_slice: entry.end_slice(),
            dispatched_at: now,
            deadline,
        });
    }
    Ok(())
}

/// Record a warning when the robot's tracked posture is not an entrance
/// state of the move about to start, then advance the posture.
fn track_posture(shared: &SessionShared, cursor: &mut Cursor, entry: &PlannedMove) {
    for subsystem in entry.info.controls.iter() {
        if let Some(current) = cursor.posture.get(&subsystem) {
            if !entry.info.admits(*current) {
                let warning = format!(
                    "move {} ({}) starts from '{current}' on {subsystem}, expected one of {{{}}}",
                    entry.index,
                    entry.info.name,
                    entry.info.entrance_list()
                );
                warn!(session_id = %shared.session_id, "{warning}");
                shared.progress.lock().posture_warnings.push(warning);
                // At most one warning per move.
                break;
            }
        }
    }
    for subsystem in entry.info.controls.iter() {
        cursor.posture.insert(subsystem, entry.info.exit_state);
    }
}

fn cap(config: &SchedulerConfig, now: Timestamp, target: Timestamp) -> Timestamp {
    match config.max_tick_interval {
        Some(max) => target.min(now + max),
        None => target,
    }
}

async fn wait_until(
    ctx: &SessionContext,
    revocations: &mut Option<broadcast::Receiver<LeaseRevocation>>,
    deadline: Timestamp,
) -> Wake {
    let shared = &ctx.shared;
    tokio::select! {
        biased;
        () = shared.abort.requested() => Wake::Stop(Stop::Aborted),
        notice = next_revocation(revocations, shared) => Wake::Stop(lease_fault(notice.reason)),
        slept = ctx.clock.sleep_until(deadline) => {
            if let Err(err) = slept {
                warn!(session_id = %shared.session_id, error = %err, "clock sleep failed");
                tokio::task::yield_now().await;
            }
            Wake::Tick
        }
    }
}

fn concerns(notice: &LeaseRevocation, shared: &SessionShared) -> bool {
    notice.lease == shared.lease
}

fn drain_revocations(
    revocations: &mut Option<broadcast::Receiver<LeaseRevocation>>,
    shared: &SessionShared,
) -> Option<LeaseRevocation> {
    let receiver = revocations.as_mut()?;
    loop {
        match receiver.try_recv() {
            Ok(notice) if concerns(&notice, shared) => return Some(notice),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => {
                *revocations = None;
                return None;
            }
        }
    }
}

async fn next_revocation(
    revocations: &mut Option<broadcast::Receiver<LeaseRevocation>>,
    shared: &SessionShared,
) -> LeaseRevocation {
    let Some(receiver) = revocations.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        match receiver.recv().await {
            Ok(notice) if concerns(&notice, shared) => return notice,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
        }
    }
}

fn lease_fault(message: String) -> Stop {
    Stop::Faulted(FaultReason::LeaseError { message })
}

async fn finish(ctx: &SessionContext, stop: Stop) -> SessionReport {
    let shared = &ctx.shared;
    let status = match stop {
        Stop::Completed => PlaybackStatus::Completed,
        Stop::Aborted => PlaybackStatus::Aborted,
        Stop::Faulted(reason) => PlaybackStatus::Faulted { reason },
    };

    if status != PlaybackStatus::Completed {
        if let Err(err) = ctx.motion.cancel(shared.session_id).await {
            warn!(session_id = %shared.session_id, error = %err, "cancel failed");
        }
    }

    // Publish the report before the status so waiters always find it.
    let report = shared.report(status.clone());
    {
        let mut history = ctx.history.lock();
        history.push_back(report.clone());
        while history.len() > ctx.config.report_history.max(1) {
            history.pop_front();
        }
    }
    shared.set_status(status.clone());

    match &status {
        PlaybackStatus::Faulted { reason } => warn!(
            session_id = %shared.session_id,
            sequence = %shared.sequence,
            %reason,
            "session faulted"
        ),
        _ => info!(
            session_id = %shared.session_id,
            sequence = %shared.sequence,
            %status,
            dispatched = report.dispatched.len(),
            skipped = report.skipped.len(),
            "session finished"
        ),
    }
    report
}
