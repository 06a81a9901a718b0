//! Cadence Testkit
//!
//! Deterministic stand-ins for the engine's effects plus shared fixtures:
//!
//! - [`SimulatedClock`]: virtual time, either jumping straight to each sleep
//!   deadline or advanced manually by the test
//! - [`RecordingMotionController`]: records activations and cancels, can be
//!   scripted to refuse or fault
//! - [`MockLeaseArbiter`]: grants and revokes leases and publishes revocations
//! - [`fixtures`]: the step/kneel_circle catalog and sequences built from it
//! - [`strategies`]: proptest strategies for tempos and sequences

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod lease;
pub mod motion;
pub mod strategies;
pub mod time;

pub use lease::MockLeaseArbiter;
pub use motion::RecordingMotionController;
pub use time::SimulatedClock;
