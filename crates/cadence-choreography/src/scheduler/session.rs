//! Execution session state shared between the scheduler and its dispatch task

use std::sync::atomic::{AtomicBool, Ordering};

use cadence_core::{ExecuteStatus, LeaseToken, PlaybackStatus, SessionId, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};

/// Cooperative cancellation flag observed by the dispatch loop
#[derive(Debug, Default)]
pub struct AbortSignal {
    requested: AtomicBool,
    wake: Notify,
}

impl AbortSignal {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // A stored permit covers the case where the loop is between waits.
        self.wake.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub async fn requested(&self) {
        if self.is_requested() {
            return;
        }
        self.wake.notified().await;
    }
}

/// A move handed to the motion controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub move_index: usize,
    pub move_type: String,
    pub start_slice: u64,
    pub end_slice: u64,
    pub dispatched_at: Timestamp,
    pub deadline: Timestamp,
}

#[derive(Debug, Default)]
pub(crate) struct Progress {
    pub current_slice: Option<u64>,
    pub dispatched: Vec<DispatchRecord>,
    pub skipped: Vec<usize>,
    pub posture_warnings: Vec<String>,
}

/// State of one session, written by its dispatch task and read by everyone else
#[derive(Debug)]
pub struct SessionShared {
    pub session_id: SessionId,
    pub sequence: String,
    pub start_time: Timestamp,
    pub start_slice: u64,
    pub lease: LeaseToken,
    pub(crate) abort: AbortSignal,
    status: watch::Sender<PlaybackStatus>,
    pub(crate) progress: Mutex<Progress>,
}

impl SessionShared {
    pub(crate) fn new(
        sequence: String,
        start_time: Timestamp,
        start_slice: u64,
        lease: LeaseToken,
    ) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::Armed);
        Self {
            session_id: SessionId::new(),
            sequence,
            start_time,
            start_slice,
            lease,
            abort: AbortSignal::default(),
            status,
            progress: Mutex::new(Progress::default()),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    pub(crate) fn set_status(&self, status: PlaybackStatus) {
        self.status.send_replace(status);
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.subscribe()
    }

    pub(crate) fn request_abort(&self) {
        self.abort.request();
    }

    /// Report for the session ending in `status`
    pub(crate) fn report(&self, status: PlaybackStatus) -> SessionReport {
        let progress = self.progress.lock();
        SessionReport {
            session_id: self.session_id,
            sequence: self.sequence.clone(),
            start_slice: self.start_slice,
            execute_status: status.execute_status(),
            status,
            dispatched: progress.dispatched.clone(),
            skipped: progress.skipped.clone(),
            posture_warnings: progress.posture_warnings.clone(),
        }
    }

    pub(crate) fn snapshot(&self) -> ChoreographyStatus {
        let status = self.status();
        if status.is_terminal() {
            return ChoreographyStatus {
                last_outcome: Some(status),
                last_session: Some(self.session_id),
                ..ChoreographyStatus::default()
            };
        }

        let progress = self.progress.lock();
        let executing = match progress.current_slice {
            Some(slice) => progress
                .dispatched
                .iter()
                .filter(|record| record.end_slice > slice)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        ChoreographyStatus {
            status,
            session_id: Some(self.session_id),
            sequence: Some(self.sequence.clone()),
            current_slice: progress.current_slice,
            executing,
            posture_warnings: progress.posture_warnings.clone(),
            last_session: None,
            last_outcome: None,
        }
    }
}

/// Caller's view of a started session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    status: watch::Receiver<PlaybackStatus>,
}

impl SessionHandle {
    pub(crate) fn new(shared: &SessionShared) -> Self {
        Self {
            session_id: shared.session_id,
            status: shared.subscribe(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// Wait for the session to reach a terminal status
    pub async fn wait(&mut self) -> PlaybackStatus {
        let terminal = self
            .status
            .wait_for(PlaybackStatus::is_terminal)
            .await
            .map(|status| (*status).clone());
        match terminal {
            Ok(status) => status,
            // Dispatch task is gone; report whatever it last published.
            Err(_) => self.status.borrow().clone(),
        }
    }
}

/// Final account of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub sequence: String,
    pub start_slice: u64,
    pub status: PlaybackStatus,
    pub execute_status: ExecuteStatus,
    /// Moves handed to the motion controller, in dispatch order
    pub dispatched: Vec<DispatchRecord>,
    /// Upload indices of moves whose range had already passed
    pub skipped: Vec<usize>,
    pub posture_warnings: Vec<String>,
}

impl SessionReport {
    pub fn dispatched_types(&self) -> Vec<&str> {
        self.dispatched.iter().map(|d| d.move_type.as_str()).collect()
    }
}

/// Snapshot of the scheduler for status queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoreographyStatus {
    pub status: PlaybackStatus,
    pub session_id: Option<SessionId>,
    pub sequence: Option<String>,
    pub current_slice: Option<u64>,
    /// Dispatched moves whose range has not yet ended
    pub executing: Vec<DispatchRecord>,
    pub posture_warnings: Vec<String>,
    /// Most recent session to finish, once the scheduler is idle again
    pub last_session: Option<SessionId>,
    pub last_outcome: Option<PlaybackStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn abort_requested_before_wait_is_not_lost() {
        let signal = AbortSignal::default();
        signal.request();
        tokio::time::timeout(std::time::Duration::from_secs(1), signal.requested())
            .await
            .unwrap();
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn handle_wait_returns_terminal_status() {
        let shared = SessionShared::new(
            "intro".into(),
            Timestamp::EPOCH,
            0,
            LeaseToken::default(),
        );
        let mut handle = SessionHandle::new(&shared);
        assert_eq!(handle.status(), PlaybackStatus::Armed);
        shared.set_status(PlaybackStatus::Running);
        shared.set_status(PlaybackStatus::Completed);
        assert_eq!(handle.wait().await, PlaybackStatus::Completed);
        assert_eq!(shared.snapshot().last_outcome, Some(PlaybackStatus::Completed));
    }
}
