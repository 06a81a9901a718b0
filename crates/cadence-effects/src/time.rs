//! System clock handler
//!
//! Reads wall-clock time from the operating system and sleeps on the tokio
//! timer. Sleeping is computed against the monotonic clock so wall-clock
//! adjustments during a sleep do not stretch it.

use async_trait::async_trait;
use cadence_core::effects::{ClockEffects, TimeError};
use cadence_core::Timestamp;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Real time handler for production use
#[derive(Debug, Clone, Default)]
pub struct SystemClockHandler;

impl SystemClockHandler {
    /// Create a new system clock handler
    pub fn new() -> Self {
        Self
    }

    fn system_now() -> Result<Timestamp, TimeError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TimeError::ClockUnavailable {
                reason: e.to_string(),
            })?;
        let nanos = u64::try_from(since_epoch.as_nanos()).unwrap_or(u64::MAX);
        Ok(Timestamp::from_unix_nanos(nanos))
    }
}

#[async_trait]
impl ClockEffects for SystemClockHandler {
    async fn now(&self) -> Timestamp {
        Self::system_now().unwrap_or(Timestamp::EPOCH)
    }

    async fn sleep_until(&self, deadline: Timestamp) -> Result<(), TimeError> {
        let now = Self::system_now()?;
        let remaining = deadline.saturating_duration_since(now);
        if remaining > Duration::ZERO {
            tokio::time::sleep(remaining).await;
        }
        Ok(())
    }

    fn resolution(&self) -> Duration {
        Duration::from_millis(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn now_is_after_epoch() {
        let clock = SystemClockHandler::new();
        assert!(clock.now().await > Timestamp::EPOCH);
    }

    #[tokio::test]
    async fn past_deadline_returns_immediately() {
        let clock = SystemClockHandler::new();
        clock.sleep_until(Timestamp::EPOCH).await.unwrap();
    }
}
