//! Execution scheduler
//!
//! Plays a validated sequence against the absolute clock. At most one session
//! is active per robot body; starting a new one aborts the previous session and
//! waits for its dispatch task to stop before the new task is spawned, so two
//! sessions never dispatch concurrently.
//!
//! # Lock usage
//!
//! - `active` is a `tokio::sync::Mutex` because session replacement awaits the
//!   previous dispatch task while holding it.
//! - Report history uses `parking_lot::Mutex`; it is never held across `.await`.

pub mod plan;
mod runner;
pub mod session;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::{
    CadenceError, ClockEffects, LeaseRevocation, LeaseToken, MotionControllerEffects,
    PlaybackStatus, SessionId, Timestamp,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::MoveCatalog;
use crate::lease_gate::LeaseGate;
use crate::store::StoredSequence;

pub use plan::{PlannedMove, PlaybackPlan};
pub use session::{ChoreographyStatus, DispatchRecord, SessionHandle, SessionReport};

use runner::SessionContext;
use session::SessionShared;

/// How often a live session re-checks its lease
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseCheckPolicy {
    /// Ask the arbiter on every dispatch tick
    #[default]
    EveryTick,
    /// Rely on revocation notices; falls back to every tick when the arbiter
    /// does not publish them
    OnRevocation,
}

/// Scheduler tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Upper bound on the sleep between ticks. `None` sleeps straight to the
    /// next slice boundary.
    pub max_tick_interval: Option<Duration>,
    /// Finished session reports kept for `wait_for_completion`
    pub report_history: usize,
    /// When a running session asks the arbiter about its lease
    pub lease_check: LeaseCheckPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_tick_interval: None,
            report_history: 16,
            lease_check: LeaseCheckPolicy::EveryTick,
        }
    }
}

/// Scheduler failures reported before a session is armed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The catalog changed since the sequence was validated
    #[error("sequence '{sequence}' uses move '{move_type}', which is not in the catalog")]
    UnknownMove { sequence: String, move_type: String },
}

impl From<SchedulerError> for CadenceError {
    fn from(err: SchedulerError) -> Self {
        CadenceError::invalid(err.to_string())
    }
}

/// Parameters of a session start
#[derive(Debug)]
pub struct StartRequest {
    /// Sequence resolved from the store at request time
    pub sequence: Arc<StoredSequence>,
    /// Absolute instant at which `start_slice` plays
    pub start_time: Timestamp,
    /// Slice of the sequence that plays at `start_time`
    pub start_slice: u64,
    /// Lease admitted by the gate; re-validated while the session runs
    pub lease: LeaseToken,
    /// Revocation notices subscribed before `lease` was admitted. `None`
    /// subscribes when the session is armed.
    pub revocations: Option<broadcast::Receiver<LeaseRevocation>>,
}

struct ActiveSession {
    shared: Arc<SessionShared>,
    task: JoinHandle<SessionReport>,
}

/// Time-driven dispatcher for validated sequences
pub struct ExecutionScheduler {
    clock: Arc<dyn ClockEffects>,
    motion: Arc<dyn MotionControllerEffects>,
    gate: Arc<LeaseGate>,
    catalog: Arc<MoveCatalog>,
    config: SchedulerConfig,
    active: tokio::sync::Mutex<Option<ActiveSession>>,
    history: Arc<Mutex<VecDeque<SessionReport>>>,
}

impl std::fmt::Debug for ExecutionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExecutionScheduler {
    pub fn new(
        clock: Arc<dyn ClockEffects>,
        motion: Arc<dyn MotionControllerEffects>,
        gate: Arc<LeaseGate>,
        catalog: Arc<MoveCatalog>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            clock,
            motion,
            gate,
            catalog,
            config,
            active: tokio::sync::Mutex::new(None),
            history: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Arm a new session, replacing any live one.
    ///
    /// The caller is expected to have admitted `request.lease` through the
    /// lease gate. A start time in the past starts immediately, positioned at
    /// the slice that is current relative to the original start time.
    pub async fn start(&self, request: StartRequest) -> Result<SessionHandle, SchedulerError> {
        let plan = Arc::new(PlaybackPlan::build(
            &request.sequence.sequence,
            &self.catalog,
        )?);
        let revocations = request.revocations.or_else(|| self.gate.revocations());

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            stop_session(previous, "replaced by a new session").await;
        }

        let shared = Arc::new(SessionShared::new(
            plan.sequence.clone(),
            request.start_time,
            request.start_slice,
            request.lease,
        ));
        let handle = SessionHandle::new(&shared);
        info!(
            session_id = %shared.session_id,
            sequence = %shared.sequence,
            revision = request.sequence.revision,
            start_time = %request.start_time,
            start_slice = request.start_slice,
            moves = plan.entries.len(),
            "arming session"
        );

        let context = SessionContext {
            shared: Arc::clone(&shared),
            plan,
            clock: Arc::clone(&self.clock),
            motion: Arc::clone(&self.motion),
            gate: Arc::clone(&self.gate),
            config: self.config.clone(),
            history: Arc::clone(&self.history),
            revocations,
        };
        let task = tokio::spawn(runner::run(context));
        *active = Some(ActiveSession { shared, task });
        Ok(handle)
    }

    /// Abort the live session, if any, and wait for its dispatch task to stop
    pub async fn abort(&self) -> Option<SessionReport> {
        let mut active = self.active.lock().await;
        let session = active.take()?;
        if session.shared.status().is_terminal() {
            *active = Some(session);
            return None;
        }
        Some(stop_session(session, "abort requested").await)
    }

    /// Snapshot of the current (or most recently finished) session
    pub async fn status(&self) -> ChoreographyStatus {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(session) => session.shared.snapshot(),
            None => match self.history.lock().back() {
                Some(last) => ChoreographyStatus {
                    last_session: Some(last.session_id),
                    last_outcome: Some(last.status.clone()),
                    ..ChoreographyStatus::default()
                },
                None => ChoreographyStatus::default(),
            },
        }
    }

    /// Wait until session `id` finishes and return its report.
    ///
    /// Returns `None` for sessions this scheduler never ran or whose report
    /// has aged out of the history.
    pub async fn wait_for_completion(&self, id: SessionId) -> Option<SessionReport> {
        let receiver = {
            let active = self.active.lock().await;
            active
                .as_ref()
                .filter(|session| session.shared.session_id == id)
                .map(|session| session.shared.subscribe())
        };
        if let Some(mut receiver) = receiver {
            // An error means the task is gone; the history is still authoritative.
            let _ = receiver.wait_for(PlaybackStatus::is_terminal).await;
        }
        self.report(id)
    }

    /// Report of a finished session
    pub fn report(&self, id: SessionId) -> Option<SessionReport> {
        self.history
            .lock()
            .iter()
            .rev()
            .find(|report| report.session_id == id)
            .cloned()
    }

    /// Reports of finished sessions, oldest first
    pub fn history(&self) -> Vec<SessionReport> {
        self.history.lock().iter().cloned().collect()
    }
}

async fn stop_session(session: ActiveSession, why: &str) -> SessionReport {
    let id = session.shared.session_id;
    if !session.shared.status().is_terminal() {
        info!(session_id = %id, reason = why, "stopping session");
        session.shared.request_abort();
    }
    match session.task.await {
        Ok(report) => report,
        Err(err) => {
            warn!(session_id = %id, error = %err, "dispatch task ended abnormally");
            session.shared.report(PlaybackStatus::Aborted)
        }
    }
}

impl Drop for ExecutionScheduler {
    fn drop(&mut self) {
        if let Some(session) = self.active.get_mut().take() {
            session.shared.request_abort();
            session.task.abort();
        }
    }
}
