//! Choreography service
//!
//! Request/response facade over the catalog, validator, store, lease gate and
//! scheduler. Responses are plain structs carrying status codes; `CadenceError`
//! is reserved for failures of the service itself.

use std::sync::Arc;

use cadence_core::{
    ChoreographySequenceRecord, ClockEffects, ExecuteStatus, LeaseEffects, LeaseToken,
    LeaseUseResult, MotionControllerEffects, MoveInfo, SessionId, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::MoveCatalog;
use crate::config::ChoreographyConfig;
use crate::lease_gate::LeaseGate;
use crate::scheduler::{ChoreographyStatus, ExecutionScheduler, SessionReport, StartRequest};
use crate::store::SequenceStore;
use crate::validation::{Diagnostic, SequenceValidator};

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub accepted: bool,
    /// Corrections applied in non-strict mode
    pub warnings: Vec<String>,
    /// Violations, when rejected
    pub diagnostics: Vec<Diagnostic>,
    /// Whether an earlier sequence of the same name was replaced
    pub replaced_previous: bool,
}

/// Execute request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub sequence_name: String,
    pub start_time: Timestamp,
    pub start_slice: u64,
    pub lease: LeaseToken,
}

/// Execute response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: ExecuteStatus,
    pub lease_use_result: LeaseUseResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Human-readable detail for non-OK statuses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Abort response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortResponse {
    pub status: ExecuteStatus,
    pub lease_use_result: LeaseUseResult,
    /// Session that was stopped, if one was live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted_session: Option<SessionId>,
}

/// `ListAllMoves` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveListing {
    pub moves: Vec<MoveInfo>,
    /// Raw move-parameter configuration, passed through untouched
    pub move_params_config: String,
}

/// Choreography request handler
#[derive(Debug)]
pub struct ChoreographyService {
    catalog: Arc<MoveCatalog>,
    validator: SequenceValidator,
    store: Arc<SequenceStore>,
    gate: Arc<LeaseGate>,
    scheduler: ExecutionScheduler,
}

impl ChoreographyService {
    /// Wire the service together.
    ///
    /// `validator` and `scheduler` must share `catalog`; the store is passed
    /// in so callers control its lifetime.
    pub fn new(
        catalog: Arc<MoveCatalog>,
        validator: SequenceValidator,
        store: Arc<SequenceStore>,
        gate: Arc<LeaseGate>,
        scheduler: ExecutionScheduler,
    ) -> Self {
        Self {
            catalog,
            validator,
            store,
            gate,
            scheduler,
        }
    }

    /// Assemble a service from configuration and injected effects
    pub fn from_config(
        config: &ChoreographyConfig,
        catalog: MoveCatalog,
        store: Arc<SequenceStore>,
        clock: Arc<dyn ClockEffects>,
        motion: Arc<dyn MotionControllerEffects>,
        arbiter: Arc<dyn LeaseEffects>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let gate = Arc::new(LeaseGate::new(arbiter));
        let validator =
            SequenceValidator::new(Arc::clone(&catalog)).with_options(config.validation_options());
        let scheduler = ExecutionScheduler::new(
            clock,
            motion,
            Arc::clone(&gate),
            Arc::clone(&catalog),
            config.scheduler_config(),
        );
        Self::new(catalog, validator, store, gate, scheduler)
    }

    pub fn store(&self) -> &Arc<SequenceStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ExecutionScheduler {
        &self.scheduler
    }

    /// Validate and store a sequence
    pub fn upload(&self, record: ChoreographySequenceRecord, non_strict: bool) -> UploadResponse {
        match self.validator.validate_record(record, non_strict) {
            Ok(accepted) => {
                let warnings = accepted.warnings.clone();
                let previous = self.store.insert(accepted.sequence, accepted.warnings);
                UploadResponse {
                    accepted: true,
                    warnings,
                    diagnostics: Vec::new(),
                    replaced_previous: previous.is_some(),
                }
            }
            Err(rejection) => UploadResponse {
                accepted: false,
                warnings: Vec::new(),
                diagnostics: rejection.diagnostics,
                replaced_previous: false,
            },
        }
    }

    /// Start playback of a stored sequence.
    ///
    /// The lease is checked first; a denial leaves the scheduler untouched.
    /// Revocation notices are subscribed before the check so one published
    /// while the session is being armed still stops it.
    pub async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse {
        let revocations = self.gate.revocations();
        let lease_use_result = match self.gate.admit(&request.lease).await {
            Ok(result) => result,
            Err(denied) => {
                return ExecuteResponse {
                    status: ExecuteStatus::LeaseError,
                    message: Some(denied.to_string()),
                    lease_use_result: denied.result,
                    session_id: None,
                };
            }
        };

        let Some(sequence) = self.store.get(&request.sequence_name) else {
            warn!(sequence = %request.sequence_name, "execute for unknown sequence");
            return ExecuteResponse {
                status: ExecuteStatus::InvalidUploadedChoreography,
                lease_use_result,
                session_id: None,
                message: Some(format!(
                    "no uploaded choreography named '{}'",
                    request.sequence_name
                )),
            };
        };

        let start = StartRequest {
            sequence,
            start_time: request.start_time,
            start_slice: request.start_slice,
            lease: request.lease,
            revocations,
        };
        match self.scheduler.start(start).await {
            Ok(handle) => ExecuteResponse {
                status: ExecuteStatus::Ok,
                lease_use_result,
                session_id: Some(handle.session_id()),
                message: None,
            },
            Err(err) => ExecuteResponse {
                status: ExecuteStatus::InvalidUploadedChoreography,
                lease_use_result,
                session_id: None,
                message: Some(err.to_string()),
            },
        }
    }

    /// Stop the live session
    pub async fn abort(&self, lease: LeaseToken) -> AbortResponse {
        match self.gate.admit(&lease).await {
            Ok(lease_use_result) => {
                let report = self.scheduler.abort().await;
                AbortResponse {
                    status: ExecuteStatus::Ok,
                    lease_use_result,
                    aborted_session: report.map(|r| r.session_id),
                }
            }
            Err(denied) => AbortResponse {
                status: ExecuteStatus::LeaseError,
                lease_use_result: denied.result,
                aborted_session: None,
            },
        }
    }

    pub fn list_all_moves(&self) -> MoveListing {
        MoveListing {
            moves: self.catalog.list_moves(),
            move_params_config: self.catalog.move_params_config().to_string(),
        }
    }

    /// Names of stored sequences, sorted
    pub fn list_all_sequences(&self) -> Vec<String> {
        self.store.names()
    }

    /// Remove a stored sequence. Sessions already playing it are unaffected.
    pub fn delete_sequence(&self, name: &str) -> bool {
        let removed = self.store.remove(name).is_some();
        if removed {
            info!(sequence = %name, "sequence deleted");
        }
        removed
    }

    pub async fn status(&self) -> ChoreographyStatus {
        self.scheduler.status().await
    }

    pub async fn wait_for_completion(&self, session_id: SessionId) -> Option<SessionReport> {
        self.scheduler.wait_for_completion(session_id).await
    }
}
