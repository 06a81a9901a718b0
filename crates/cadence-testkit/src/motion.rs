//! Recording motion controller

use async_trait::async_trait;
use cadence_core::{MotionControllerEffects, MotionError, MoveAck, MoveCommand, SessionId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Recorder {
    activations: Vec<MoveCommand>,
    cancels: Vec<SessionId>,
    refuse: HashSet<String>,
    pending_fault: Option<MotionError>,
    fault_after: Option<(String, String)>,
    held: Option<String>,
    holding: bool,
}

/// Motion controller that records every call.
///
/// Clones share the same recording, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct RecordingMotionController {
    inner: Arc<Mutex<Recorder>>,
    released: Arc<Notify>,
}

impl RecordingMotionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every activation of `move_type`
    pub fn refuse(&self, move_type: &str) {
        self.inner.lock().refuse.insert(move_type.to_string());
    }

    /// Report a fault on the next poll
    pub fn inject_fault(&self, reason: &str) {
        self.inner.lock().pending_fault = Some(MotionError::Fault {
            move_type: "unknown".into(),
            reason: reason.to_string(),
        });
    }

    /// Accept `move_type`, then report a fault on the following poll
    pub fn fault_after(&self, move_type: &str, reason: &str) {
        self.inner.lock().fault_after = Some((move_type.to_string(), reason.to_string()));
    }

    /// Park the next activation of `move_type` inside `activate` until
    /// [`release`](Self::release) is called
    pub fn hold(&self, move_type: &str) {
        self.inner.lock().held = Some(move_type.to_string());
    }

    /// Let the parked activation return
    pub fn release(&self) {
        self.released.notify_one();
    }

    /// Whether an activation is currently parked
    pub fn is_holding(&self) -> bool {
        self.inner.lock().holding
    }

    pub fn activations(&self) -> Vec<MoveCommand> {
        self.inner.lock().activations.clone()
    }

    pub fn activated_types(&self) -> Vec<String> {
        self.inner
            .lock()
            .activations
            .iter()
            .map(|command| command.move_type.clone())
            .collect()
    }

    pub fn cancels(&self) -> Vec<SessionId> {
        self.inner.lock().cancels.clone()
    }
}

#[async_trait]
impl MotionControllerEffects for RecordingMotionController {
    async fn activate(&self, command: MoveCommand) -> Result<MoveAck, MotionError> {
        let parked = {
            let mut recorder = self.inner.lock();
            let parked = recorder.held.as_deref() == Some(command.move_type.as_str());
            if parked {
                recorder.held = None;
                recorder.holding = true;
            }
            parked
        };
        if parked {
            self.released.notified().await;
            self.inner.lock().holding = false;
        }

        let mut recorder = self.inner.lock();
        if recorder.refuse.contains(&command.move_type) {
            return Err(MotionError::Rejected {
                move_type: command.move_type,
                reason: "scripted refusal".into(),
            });
        }
        if let Some((move_type, reason)) = recorder.fault_after.clone() {
            if move_type == command.move_type {
                recorder.fault_after = None;
                recorder.pending_fault = Some(MotionError::Fault { move_type, reason });
            }
        }
        let ack = MoveAck {
            session_id: command.session_id,
            move_index: command.move_index,
        };
        recorder.activations.push(command);
        Ok(ack)
    }

    async fn cancel(&self, session: SessionId) -> Result<(), MotionError> {
        self.inner.lock().cancels.push(session);
        Ok(())
    }

    async fn poll_fault(&self, _session: SessionId) -> Option<MotionError> {
        self.inner.lock().pending_fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::params::StepParams;
    use cadence_core::{MoveParamsPayload, Timestamp};

    fn command(move_type: &str) -> MoveCommand {
        MoveCommand {
            session_id: SessionId::new(),
            sequence: "held".into(),
            move_index: 0,
            move_type: move_type.into(),
            payload: MoveParamsPayload::Step(StepParams::default()),
            start_slice: 0,
            end_slice: 4,
            dispatched_at: Timestamp::from_unix_secs(0),
            deadline: Timestamp::from_unix_secs(2),
        }
    }

    #[tokio::test]
    async fn held_activation_returns_after_release() {
        let motion = RecordingMotionController::new();
        motion.hold("step");

        let task = tokio::spawn({
            let motion = motion.clone();
            async move { motion.activate(command("step")).await }
        });
        while !motion.is_holding() {
            tokio::task::yield_now().await;
        }
        assert!(motion.activations().is_empty());

        motion.release();
        assert!(task.await.unwrap().is_ok());
        assert!(!motion.is_holding());
        assert_eq!(motion.activated_types(), vec!["step".to_string()]);

        // Only the first matching activation is parked.
        motion.activate(command("step")).await.unwrap();
        assert_eq!(motion.activations().len(), 2);
    }
}
