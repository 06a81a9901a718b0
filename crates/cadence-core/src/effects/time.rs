//! Wall-clock effect interface.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `cadence-effects` (system clock), `cadence-testkit` (simulated clock)
//! - **Usage**: the execution scheduler; nothing else reads the clock directly

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::time::Timestamp;
use crate::CadenceError;

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    #[error("Clock unavailable: {reason}")]
    ClockUnavailable { reason: String },
    #[error("Sleep interrupted: {reason}")]
    Interrupted { reason: String },
}

impl From<TimeError> for CadenceError {
    fn from(err: TimeError) -> Self {
        CadenceError::internal(err.to_string())
    }
}

/// Absolute clock used to align playback with the beat grid.
#[async_trait]
pub trait ClockEffects: Send + Sync {
    /// Current wall-clock instant
    async fn now(&self) -> Timestamp;

    /// Suspend until `deadline`; returns immediately if it already passed
    async fn sleep_until(&self, deadline: Timestamp) -> Result<(), TimeError>;

    /// Granularity of the clock
    fn resolution(&self) -> Duration {
        Duration::from_millis(1)
    }
}

/// Blanket implementation for Arc<T> where T: ClockEffects
#[async_trait]
impl<T: ClockEffects + ?Sized> ClockEffects for std::sync::Arc<T> {
    async fn now(&self) -> Timestamp {
        (**self).now().await
    }

    async fn sleep_until(&self, deadline: Timestamp) -> Result<(), TimeError> {
        (**self).sleep_until(deadline).await
    }

    fn resolution(&self) -> Duration {
        (**self).resolution()
    }
}
