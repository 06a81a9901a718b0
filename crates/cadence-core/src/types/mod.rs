//! Choreography data model

pub mod lease;
pub mod move_info;
pub mod params;
pub mod sequence;
pub mod status;
pub mod subsystem;
pub mod transition;

pub use lease::{LeaseToken, LeaseUseResult, LeaseUseStatus};
pub use move_info::MoveInfo;
pub use params::{MoveParamsKind, MoveParamsPayload, MoveParamsSlots, PayloadShapeError};
pub use sequence::{
    ChoreographySequence, ChoreographySequenceRecord, MoveParams, MoveParamsRecord,
};
pub use status::{ExecuteStatus, FaultReason, PlaybackStatus};
pub use subsystem::{Subsystem, Subsystems};
pub use transition::TransitionState;
