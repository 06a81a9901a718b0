//! Cadence Core - Choreography Domain Model
//!
//! Foundational types and effect interfaces for the choreography engine. This
//! crate holds no scheduling or validation logic; it defines the vocabulary
//! the higher layers share.
//!
//! # Contents
//!
//! ## Data model
//! - `MoveInfo`: catalog entry with posture, duration and subsystem constraints
//! - `MoveParams` / `ChoreographySequence`: timed move instances and their container
//! - `MoveParamsPayload`: closed sum type over the move-specific parameter kinds
//! - `TransitionState`, `Subsystems`: adjacency and overlap vocabulary
//!
//! ## Time
//! - `Tempo`: slices per minute with exact slice ↔ duration conversion
//! - `Timestamp`: absolute instant in nanoseconds
//!
//! ## Effect Interfaces (Pure Signatures)
//! - `ClockEffects`: `now`, `sleep_until`
//! - `MotionControllerEffects`: `activate`, `cancel`, `poll_fault`
//! - `LeaseEffects`: `validate`, `subscribe_revocations`

#![allow(missing_docs)]
#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Session identifiers
pub mod identifiers;

/// Choreography data model
pub mod types;

/// Tempo, slice conversion and timestamps
pub mod time;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Configuration traits and validation
pub mod config;

pub use errors::{CadenceError, Result as CadenceResult};
pub use identifiers::SessionId;
pub use time::{seconds_to_slice, slice_to_seconds, Tempo, Timestamp};
pub use types::*;

pub use effects::{
    ClockEffects, LeaseEffects, LeaseError, LeaseRevocation, MotionControllerEffects, MotionError,
    MoveAck, MoveCommand, TimeError,
};
