//! Motion controller effect interface.
//!
//! The limb/motion controller is an external collaborator: it receives one
//! activation per move and executes the trajectory on its own. The scheduler
//! only decides *when* to activate and *whether* to cancel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identifiers::SessionId;
use crate::time::Timestamp;
use crate::types::MoveParamsPayload;
use crate::CadenceError;

/// Activation of one move, sent when its slice range becomes current
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Session issuing the command
    pub session_id: SessionId,
    /// Sequence the move belongs to
    pub sequence: String,
    /// Position of the move in the uploaded sequence
    pub move_index: usize,
    /// Move type name
    pub move_type: String,
    /// Resolved parameter payload
    pub payload: MoveParamsPayload,
    /// First slice of the move
    pub start_slice: u64,
    /// Slice just past the move
    pub end_slice: u64,
    /// Instant the move is dispatched
    pub dispatched_at: Timestamp,
    /// Instant the move's slice range ends
    pub deadline: Timestamp,
}

/// Controller acknowledgement of an activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAck {
    /// Session the acknowledged move belongs to
    pub session_id: SessionId,
    /// Position of the move in the uploaded sequence
    pub move_index: usize,
}

/// Errors reported by the motion controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MotionError {
    /// Controller refused the activation
    #[error("move '{move_type}' rejected: {reason}")]
    Rejected { move_type: String, reason: String },
    /// Move failed while executing
    #[error("move '{move_type}' faulted: {reason}")]
    Fault { move_type: String, reason: String },
    /// Controller is not reachable
    #[error("motion controller unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<MotionError> for CadenceError {
    fn from(err: MotionError) -> Self {
        CadenceError::motion(err.to_string())
    }
}

/// Low-level move executor.
#[async_trait]
pub trait MotionControllerEffects: Send + Sync {
    /// Start executing a move; returns once the controller accepted or refused it
    async fn activate(&self, command: MoveCommand) -> Result<MoveAck, MotionError>;

    /// Cancel every in-flight move of `session`
    async fn cancel(&self, session: SessionId) -> Result<(), MotionError>;

    /// Fault raised by an in-flight move since the last poll, if any
    async fn poll_fault(&self, _session: SessionId) -> Option<MotionError> {
        None
    }
}

/// Blanket implementation for Arc<T> where T: MotionControllerEffects
#[async_trait]
impl<T: MotionControllerEffects + ?Sized> MotionControllerEffects for std::sync::Arc<T> {
    async fn activate(&self, command: MoveCommand) -> Result<MoveAck, MotionError> {
        (**self).activate(command).await
    }

    async fn cancel(&self, session: SessionId) -> Result<(), MotionError> {
        (**self).cancel(session).await
    }

    async fn poll_fault(&self, session: SessionId) -> Option<MotionError> {
        (**self).poll_fault(session).await
    }
}
