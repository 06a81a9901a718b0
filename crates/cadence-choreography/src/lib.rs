//! Cadence Choreography - Validation and Time-Synchronized Execution
//!
//! The engine between an uploaded dance and the motion controller:
//!
//! - [`MoveCatalog`]: registry of move types and their constraints
//! - [`SequenceValidator`]: structural, bounds and continuity checks with
//!   non-strict correction
//! - [`SequenceStore`]: accepted sequences keyed by name
//! - [`LeaseGate`]: exclusive-ownership check in front of the scheduler
//! - [`ExecutionScheduler`]: slice-accurate dispatch against the absolute clock
//! - [`ChoreographyService`]: request/response facade tying them together
//!
//! Effects (clock, motion controller, lease arbiter) are injected as
//! `cadence_core` effect traits; production handlers live in
//! `cadence-effects` and deterministic ones in `cadence-testkit`.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod lease_gate;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod validation;

pub use catalog::MoveCatalog;
pub use config::{ChoreographyConfig, DEFAULT_CONFIG_PATH};
pub use lease_gate::{LeaseDenied, LeaseGate};
pub use scheduler::{
    ChoreographyStatus, DispatchRecord, ExecutionScheduler, LeaseCheckPolicy, SchedulerConfig,
    SchedulerError, SessionHandle, SessionReport, StartRequest,
};
pub use service::{
    AbortResponse, ChoreographyService, ExecuteRequest, ExecuteResponse, MoveListing,
    UploadResponse,
};
pub use store::{SequenceStore, StoredSequence};
pub use validation::{
    AcceptedSequence, Diagnostic, Rejection, SequenceValidator, ValidationOptions,
    ViolationCategory,
};
