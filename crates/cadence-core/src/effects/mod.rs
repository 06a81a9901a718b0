//! Pure effect interfaces (no implementations)
//!
//! Production handlers live in `cadence-effects`; deterministic handlers for
//! tests live in `cadence-testkit`.

pub mod lease;
pub mod motion;
pub mod time;

pub use lease::{LeaseEffects, LeaseError, LeaseRevocation};
pub use motion::{MotionControllerEffects, MotionError, MoveAck, MoveCommand};
pub use time::{ClockEffects, TimeError};

