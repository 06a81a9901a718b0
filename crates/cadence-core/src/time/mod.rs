//! Time primitives: tempo, slice conversion and absolute timestamps

pub mod slice;
pub mod timestamp;

pub use slice::{seconds_to_slice, slice_to_seconds, Tempo};
pub use timestamp::Timestamp;
