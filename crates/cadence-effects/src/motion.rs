//! Dry-run motion controller
//!
//! Accepts every activation and logs it. Used by the CLI to rehearse a
//! sequence against the real clock without a robot attached.

use async_trait::async_trait;
use cadence_core::effects::{MotionControllerEffects, MotionError, MoveAck, MoveCommand};
use cadence_core::SessionId;
use parking_lot::Mutex;
use tracing::info;

/// Motion controller that only logs what it would execute
#[derive(Debug, Default)]
pub struct DryRunMotionController {
    activations: Mutex<u64>,
}

impl DryRunMotionController {
    /// Create a new dry-run controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of activations accepted so far
    pub fn activation_count(&self) -> u64 {
        *self.activations.lock()
    }
}

#[async_trait]
impl MotionControllerEffects for DryRunMotionController {
    async fn activate(&self, command: MoveCommand) -> Result<MoveAck, MotionError> {
        *self.activations.lock() += 1;
        info!(
            session_id = %command.session_id,
            sequence = %command.sequence,
            move_type = %command.move_type,
            start_slice = command.start_slice,
            end_slice = command.end_slice,
            deadline = %command.deadline,
            params = %command.payload.describe(),
            "dry-run activation"
        );
        Ok(MoveAck {
            session_id: command.session_id,
            move_index: command.move_index,
        })
    }

    async fn cancel(&self, session: SessionId) -> Result<(), MotionError> {
        info!(session_id = %session, "dry-run cancellation");
        Ok(())
    }
}
