//! Cadence Effects - Production Handlers
//!
//! Stateless implementations of the `cadence-core` effect interfaces:
//! the system clock, a dry-run motion controller that logs activations, and a
//! static lease arbiter for single-operator deployments.
//!
//! **Layer Constraint**: NO mock handlers - those belong in `cadence-testkit`.

#![forbid(unsafe_code)]

pub mod lease;
pub mod motion;
pub mod time;

pub use lease::StaticLeaseArbiter;
pub use motion::DryRunMotionController;
pub use time::SystemClockHandler;
