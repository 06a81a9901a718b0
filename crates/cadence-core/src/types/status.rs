//! Status codes reported by the choreography service and sessions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an execute request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecuteStatus {
    /// Request accepted (or session completed cleanly)
    Ok,
    /// Named sequence is not in the store
    InvalidUploadedChoreography,
    /// Motion controller refused or failed a move
    RobotCommandIssues,
    /// Lease check failed or the lease was revoked
    LeaseError,
}

impl fmt::Display for ExecuteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecuteStatus::Ok => "STATUS_OK",
            ExecuteStatus::InvalidUploadedChoreography => "STATUS_INVALID_UPLOADED_CHOREOGRAPHY",
            ExecuteStatus::RobotCommandIssues => "STATUS_ROBOT_COMMAND_ISSUES",
            ExecuteStatus::LeaseError => "STATUS_LEASE_ERROR",
        })
    }
}

/// Why a session ended in the faulted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FaultReason {
    /// Motion controller reported a failure
    RobotCommandIssues {
        /// Controller-supplied detail
        message: String,
    },
    /// Lease became invalid while the session was live
    LeaseError {
        /// Arbiter-supplied detail
        message: String,
    },
}

impl FaultReason {
    /// Execute status equivalent of this fault
    pub fn execute_status(&self) -> ExecuteStatus {
        match self {
            FaultReason::RobotCommandIssues { .. } => ExecuteStatus::RobotCommandIssues,
            FaultReason::LeaseError { .. } => ExecuteStatus::LeaseError,
        }
    }
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultReason::RobotCommandIssues { message } => {
                write!(f, "robot command issues: {message}")
            }
            FaultReason::LeaseError { message } => write!(f, "lease error: {message}"),
        }
    }
}

/// Playback state of the execution scheduler.
///
/// `Idle → Armed → Running → {Completed, Aborted, Faulted}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PlaybackStatus {
    /// No session
    #[default]
    Idle,
    /// Session accepted, waiting for its start time
    Armed,
    /// Dispatching moves
    Running,
    /// Every move played to its deadline
    Completed,
    /// Cancelled by request or replaced by a newer session
    Aborted,
    /// Stopped by a runtime failure
    Faulted {
        /// Cause of the fault
        reason: FaultReason,
    },
}

impl PlaybackStatus {
    /// Whether the status ends a session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackStatus::Completed | PlaybackStatus::Aborted | PlaybackStatus::Faulted { .. }
        )
    }

    /// Whether a session in this status may still dispatch moves
    pub fn is_live(&self) -> bool {
        matches!(self, PlaybackStatus::Armed | PlaybackStatus::Running)
    }

    /// Execute status a caller sees for a session ending in this status
    pub fn execute_status(&self) -> ExecuteStatus {
        match self {
            PlaybackStatus::Faulted { reason } => reason.execute_status(),
            _ => ExecuteStatus::Ok,
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Idle => f.write_str("idle"),
            PlaybackStatus::Armed => f.write_str("armed"),
            PlaybackStatus::Running => f.write_str("running"),
            PlaybackStatus::Completed => f.write_str("completed"),
            PlaybackStatus::Aborted => f.write_str("aborted"),
            PlaybackStatus::Faulted { reason } => write!(f, "faulted ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_map_to_execute_status() {
        let status = PlaybackStatus::Faulted {
            reason: FaultReason::LeaseError {
                message: "revoked".into(),
            },
        };
        assert!(status.is_terminal());
        assert_eq!(status.execute_status(), ExecuteStatus::LeaseError);
        assert_eq!(PlaybackStatus::Aborted.execute_status(), ExecuteStatus::Ok);
    }

    #[test]
    fn execute_status_uses_protocol_names() {
        assert_eq!(
            ExecuteStatus::RobotCommandIssues.to_string(),
            "STATUS_ROBOT_COMMAND_ISSUES"
        );
        let json = serde_json::to_string(&ExecuteStatus::LeaseError).unwrap();
        assert_eq!(json, "\"LEASE_ERROR\"");
    }
}
